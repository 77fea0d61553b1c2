//! Image containers and views
//!
//! Images are strided views over a flat pixel buffer described by [`Shape`],
//! so sub-rectangle operations do not copy. [`ImageOwned`] owns its buffer;
//! [`ImageRef`]/[`ImageMutRef`] borrow one.
use crate::Color;
use std::{any::type_name, fmt, io::Write};

/// Image size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    pub width: usize,
    pub height: usize,
}

impl Size {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Shape defines size and layout of the data inside an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    /// Offset of the first element
    pub start: usize,
    /// Width of the image
    pub width: usize,
    /// Height of the image
    pub height: usize,
    /// How many elements we need to skip to get to the next row
    pub row_stride: usize,
    /// How many elements we need to skip to get to the next column
    pub col_stride: usize,
}

impl Shape {
    /// Create shape for a simple image with zero offset and row-major order
    pub fn simple(size: Size) -> Self {
        Shape {
            start: 0,
            width: size.width,
            height: size.height,
            row_stride: size.width,
            col_stride: 1,
        }
    }

    /// Convert row and column pair to the data offset
    #[inline]
    pub fn offset(&self, row: usize, col: usize) -> usize {
        self.start + row * self.row_stride + col * self.col_stride
    }

    /// Get row and column pair by linear index
    #[inline]
    pub fn nth(&self, n: usize) -> Option<(usize, usize)> {
        if self.width == 0 {
            return None;
        }
        let row = n / self.width;
        let col = n - row * self.width;
        (row < self.height).then_some((row, col))
    }

    /// Get the size of the image
    #[inline]
    pub fn size(&self) -> Size {
        Size {
            width: self.width,
            height: self.height,
        }
    }
}

fn view_shape(
    shape: Shape,
    row_min: usize,
    row_max: usize,
    col_min: usize,
    col_max: usize,
) -> Shape {
    let row_min = row_min.min(shape.height);
    let row_max = row_max.min(shape.height);
    let col_min = col_min.min(shape.width);
    let col_max = col_max.min(shape.width);
    Shape {
        start: shape.offset(row_min, col_min),
        width: col_max.saturating_sub(col_min),
        height: row_max.saturating_sub(row_min),
        ..shape
    }
}

/// Trait common to all image types
pub trait Image {
    /// Pixel type
    type Pixel;

    /// Data containing the image
    fn data(&self) -> &[Self::Pixel];

    /// Shape of the image
    fn shape(&self) -> Shape;

    /// Image size
    fn size(&self) -> Size {
        self.shape().size()
    }

    /// Image width
    fn width(&self) -> usize {
        self.shape().width
    }

    /// Image height
    fn height(&self) -> usize {
        self.shape().height
    }

    /// Get pixel at the specified row and column
    fn get(&self, row: usize, col: usize) -> Option<&Self::Pixel> {
        if row < self.height() && col < self.width() {
            self.data().get(self.shape().offset(row, col))
        } else {
            None
        }
    }

    /// Create sub-image bounded by constraints, `_max` values are not inclusive
    fn view(
        &self,
        row_min: usize,
        row_max: usize,
        col_min: usize,
        col_max: usize,
    ) -> ImageRef<'_, Self::Pixel> {
        ImageRef {
            shape: view_shape(self.shape(), row_min, row_max, col_min, col_max),
            data: self.data(),
        }
    }

    /// Create immutable view of the image with the concrete `ImageRef` type
    fn as_ref(&self) -> ImageRef<'_, Self::Pixel> {
        ImageRef {
            shape: self.shape(),
            data: self.data(),
        }
    }

    /// Iterate over pixels in row-major order
    fn iter(&self) -> ImageIter<'_, Self::Pixel> {
        ImageIter {
            index: 0,
            shape: self.shape(),
            data: self.data(),
        }
    }

    /// Write raw RGBA data
    fn write_rgba<W>(&self, mut out: W) -> Result<(), std::io::Error>
    where
        W: Write,
        Self::Pixel: Color,
        Self: Sized,
    {
        for color in self.iter() {
            out.write_all(&color.to_rgba())?;
        }
        Ok(())
    }

    /// Write image in PPM format
    fn write_ppm<W>(&self, mut out: W) -> Result<(), std::io::Error>
    where
        W: Write,
        Self::Pixel: Color,
        Self: Sized,
    {
        write!(out, "P6 {} {} 255 ", self.width(), self.height())?;
        for color in self.iter() {
            out.write_all(&color.to_rgb())?;
        }
        Ok(())
    }

    /// Write image in PNG format
    #[cfg(feature = "png")]
    fn write_png<W>(&self, out: W) -> Result<(), png::EncodingError>
    where
        W: Write,
        Self::Pixel: Color,
        Self: Sized,
    {
        let mut encoder = png::Encoder::new(out, self.width() as u32, self.height() as u32);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        let mut stream_writer = writer.stream_writer()?;
        for color in self.iter() {
            stream_writer.write_all(&color.to_rgba())?;
        }
        stream_writer.flush()?;
        Ok(())
    }
}

/// Mutable image interface
pub trait ImageMut: Image {
    /// Get a mutable slice of image data
    fn data_mut(&mut self) -> &mut [Self::Pixel];

    /// Get a mutable reference to the specified pixel
    fn get_mut(&mut self, row: usize, col: usize) -> Option<&mut Self::Pixel> {
        if row < self.height() && col < self.width() {
            let index = self.shape().offset(row, col);
            self.data_mut().get_mut(index)
        } else {
            None
        }
    }

    /// Create mutable sub-image bounded by constraints, `_max` values are not inclusive
    fn view_mut(
        &mut self,
        row_min: usize,
        row_max: usize,
        col_min: usize,
        col_max: usize,
    ) -> ImageMutRef<'_, Self::Pixel> {
        ImageMutRef {
            shape: view_shape(self.shape(), row_min, row_max, col_min, col_max),
            data: self.data_mut(),
        }
    }

    /// Create mutable view of the image with the concrete `ImageMutRef` type
    fn as_mut(&mut self) -> ImageMutRef<'_, Self::Pixel> {
        ImageMutRef {
            shape: self.shape(),
            data: self.data_mut(),
        }
    }

    /// Fill image with the default pixel value
    fn clear(&mut self)
    where
        Self::Pixel: Default,
    {
        let shape = self.shape();
        let data = self.data_mut();
        for row in 0..shape.height {
            for col in 0..shape.width {
                data[shape.offset(row, col)] = Default::default();
            }
        }
    }
}

/// Immutable iterator over pixels
pub struct ImageIter<'a, P> {
    index: usize,
    shape: Shape,
    data: &'a [P],
}

impl<'a, P> Iterator for ImageIter<'a, P> {
    type Item = &'a P;

    fn next(&mut self) -> Option<Self::Item> {
        let (row, col) = self.shape.nth(self.index)?;
        self.index += 1;
        self.data.get(self.shape.offset(row, col))
    }
}

/// Image that owns its data
#[derive(Clone)]
pub struct ImageOwned<P> {
    shape: Shape,
    data: Vec<P>,
}

impl<P> fmt::Debug for ImageOwned<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageOwned")
            .field("shape", &self.shape)
            .field("dtype", &type_name::<P>())
            .finish_non_exhaustive()
    }
}

impl<P> ImageOwned<P> {
    /// Construct owned image from the `data` and the `shape`
    pub fn new(shape: Shape, data: Vec<P>) -> Self {
        Self { shape, data }
    }

    /// Construct image of the provided size filled with the default pixel
    pub fn new_default(size: Size) -> Self
    where
        P: Default + Clone,
    {
        Self {
            shape: Shape::simple(size),
            data: vec![P::default(); size.width * size.height],
        }
    }

    /// Construct image of the provided size filled with the given pixel
    pub fn new_with(size: Size, pixel: P) -> Self
    where
        P: Clone,
    {
        Self {
            shape: Shape::simple(size),
            data: vec![pixel; size.width * size.height],
        }
    }

    /// Empty image of zero size
    pub fn empty() -> Self {
        Self {
            shape: Shape::simple(Size::default()),
            data: Vec::new(),
        }
    }

    /// Consume the image returning its data
    pub fn into_vec(self) -> Vec<P> {
        self.data
    }
}

impl<P> Image for ImageOwned<P> {
    type Pixel = P;

    fn data(&self) -> &[Self::Pixel] {
        &self.data
    }

    fn shape(&self) -> Shape {
        self.shape
    }
}

impl<P> ImageMut for ImageOwned<P> {
    fn data_mut(&mut self) -> &mut [Self::Pixel] {
        &mut self.data
    }
}

/// Immutable borrowed view into an image
#[derive(Debug, Clone, Copy)]
pub struct ImageRef<'a, P> {
    shape: Shape,
    data: &'a [P],
}

impl<'a, P> Image for ImageRef<'a, P> {
    type Pixel = P;

    fn data(&self) -> &[Self::Pixel] {
        self.data
    }

    fn shape(&self) -> Shape {
        self.shape
    }
}

/// Mutable borrowed view into an image
#[derive(Debug)]
pub struct ImageMutRef<'a, P> {
    shape: Shape,
    data: &'a mut [P],
}

impl<'a, P> Image for ImageMutRef<'a, P> {
    type Pixel = P;

    fn data(&self) -> &[Self::Pixel] {
        self.data
    }

    fn shape(&self) -> Shape {
        self.shape
    }
}

impl<'a, P> ImageMut for ImageMutRef<'a, P> {
    fn data_mut(&mut self) -> &mut [Self::Pixel] {
        self.data
    }
}

impl<'a, I: Image + ?Sized> Image for &'a I {
    type Pixel = I::Pixel;

    fn data(&self) -> &[Self::Pixel] {
        (**self).data()
    }

    fn shape(&self) -> Shape {
        (**self).shape()
    }
}

impl<'a, I: Image + ?Sized> Image for &'a mut I {
    type Pixel = I::Pixel;

    fn data(&self) -> &[Self::Pixel] {
        (**self).data()
    }

    fn shape(&self) -> Shape {
        (**self).shape()
    }
}

impl<'a, I: ImageMut + ?Sized> ImageMut for &'a mut I {
    fn data_mut(&mut self) -> &mut [Self::Pixel] {
        (**self).data_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape() {
        let shape = Shape::simple(Size::new(4, 3));
        assert_eq!(shape.offset(0, 0), 0);
        assert_eq!(shape.offset(1, 2), 6);
        assert_eq!(shape.nth(0), Some((0, 0)));
        assert_eq!(shape.nth(5), Some((1, 1)));
        assert_eq!(shape.nth(12), None);
    }

    #[test]
    fn test_image_view() {
        let mut img: ImageOwned<u32> = ImageOwned::new_default(Size::new(5, 4));
        for (index, pixel) in img.data_mut().iter_mut().enumerate() {
            *pixel = index as u32;
        }
        let view = img.view(1, 3, 2, 5);
        assert_eq!(view.size(), Size::new(3, 2));
        assert_eq!(view.get(0, 0), Some(&7));
        assert_eq!(view.get(1, 2), Some(&14));
        assert_eq!(view.get(2, 0), None);

        // views clamp to the image bounds
        let view = img.view(2, 100, 4, 100);
        assert_eq!(view.size(), Size::new(1, 2));
    }

    #[test]
    fn test_iter() {
        let mut img: ImageOwned<u32> = ImageOwned::new_default(Size::new(3, 2));
        for (index, pixel) in img.data_mut().iter_mut().enumerate() {
            *pixel = index as u32;
        }
        let values: Vec<u32> = img.iter().copied().collect();
        assert_eq!(values, vec![0, 1, 2, 3, 4, 5]);

        // iteration over a view only visits the view
        let values: Vec<u32> = img.view(0, 2, 1, 3).iter().copied().collect();
        assert_eq!(values, vec![1, 2, 4, 5]);
    }

    #[test]
    fn test_clear() {
        let mut img: ImageOwned<u32> = ImageOwned::new_with(Size::new(2, 2), 7);
        img.clear();
        assert!(img.iter().all(|p| *p == 0));
    }
}
