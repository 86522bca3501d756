use std::mem;

use crate::color::Pixel;
use crate::error::RasterError;

pub mod reader;
pub mod writer;

/// Largest channel value the 8-bit storage can hold.
pub const MAX_CHANNEL_VALUE: u8 = u8::MAX;

/// A decoded image: dimensions, the declared max value and the pixel rows.
///
/// Every row holds exactly `width` pixels and there are exactly `height` rows.
/// Both dimensions are non-zero and no channel exceeds `max_value`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    width: usize,
    height: usize,
    max_value: u8,
    rows: Vec<Vec<Pixel>>,
}

impl Raster {
    /// Assemble a raster from rows of pixels with a max value of 255.
    pub fn new(rows: Vec<Vec<Pixel>>) -> Result<Self, RasterError> {
        Self::with_max_value(MAX_CHANNEL_VALUE, rows)
    }

    pub fn with_max_value(max_value: u8, rows: Vec<Vec<Pixel>>) -> Result<Self, RasterError> {
        if max_value == 0 {
            return Err(RasterError::ZeroMaxValue);
        }
        let width = Self::check_row_lengths(&rows)?;
        Self::check_channels_within_max_value(&rows, max_value)?;
        Ok(Raster {
            width,
            height: rows.len(),
            max_value,
            rows,
        })
    }

    /// A `width` x `height` raster where every pixel is black.
    ///
    /// Returns `None` when the pixel storage cannot be allocated.
    pub(crate) fn blank(width: usize, height: usize, max_value: u8) -> Option<Self> {
        let pixel_bytes = width
            .checked_mul(height)?
            .checked_mul(mem::size_of::<Pixel>())?;
        let row_bytes = height.checked_mul(mem::size_of::<Vec<Pixel>>())?;
        pixel_bytes.checked_add(row_bytes).filter(|bytes| *bytes <= isize::MAX as usize)?;
        let mut rows = Vec::new();
        rows.try_reserve_exact(height).ok()?;
        for _ in 0..height {
            let mut row = Vec::new();
            row.try_reserve_exact(width).ok()?;
            row.resize(width, Pixel::BLACK);
            rows.push(row);
        }
        Some(Raster {
            width,
            height,
            max_value,
            rows,
        })
    }

    fn check_row_lengths(rows: &[Vec<Pixel>]) -> Result<usize, RasterError> {
        let width = rows.first().map(Vec::len).unwrap_or(0);
        if width == 0 {
            return Err(RasterError::Empty);
        }
        for (index, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(RasterError::RaggedRow {
                    row: index,
                    expected: width,
                    actual: row.len(),
                });
            }
        }
        Ok(width)
    }

    fn check_channels_within_max_value(
        rows: &[Vec<Pixel>],
        max_value: u8,
    ) -> Result<(), RasterError> {
        for (row_index, row) in rows.iter().enumerate() {
            for (column_index, pixel) in row.iter().enumerate() {
                Self::check_pixel_within_max_value(pixel, max_value, column_index, row_index)?;
            }
        }
        Ok(())
    }

    fn check_pixel_within_max_value(
        pixel: &Pixel,
        max_value: u8,
        column: usize,
        row: usize,
    ) -> Result<(), RasterError> {
        let value = pixel.brightest_channel();
        if value > max_value {
            return Err(RasterError::ChannelExceedsMaxValue {
                row,
                column,
                value,
                max_value,
            });
        }
        Ok(())
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn max_value(&self) -> u8 {
        self.max_value
    }

    pub fn rows(&self) -> &[Vec<Pixel>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&[Pixel]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn pixel(&self, column: usize, row: usize) -> Option<Pixel> {
        self.rows.get(row)?.get(column).copied()
    }

    pub fn set_pixel(
        &mut self,
        column: usize,
        row: usize,
        pixel: Pixel,
    ) -> Result<(), RasterError> {
        if column >= self.width || row >= self.height {
            return Err(RasterError::OutOfBounds { column, row });
        }
        Self::check_pixel_within_max_value(&pixel, self.max_value, column, row)?;
        self.rows[row][column] = pixel;
        Ok(())
    }

    /// Store a pixel the caller has already bounds- and range-checked.
    pub(crate) fn put(&mut self, column: usize, row: usize, pixel: Pixel) {
        self.rows[row][column] = pixel;
    }

    pub fn into_rows(self) -> Vec<Vec<Pixel>> {
        self.rows
    }
}

/// A source of rasters.
pub trait ImageReader {
    type Error;

    fn read_image(&mut self) -> Result<Raster, Self::Error>;
}

/// A sink for rasters.
pub trait ImageWriter {
    type Error;

    fn write_image(&mut self, raster: &Raster) -> Result<(), Self::Error>;
}
