use std::io::{self, Write};

use super::super::{ImageWriter, Raster, MAX_CHANNEL_VALUE};
use crate::color::Pixel;
use crate::error::EncodeError;

const MAGIC_TOKEN: &str = "P3";
const PIXEL_SEPARATOR: &str = "\t";
const LINE_TERMINATOR: &str = "\n";

/// Writes rasters as P3 text.
///
/// The max value line is always `255`, whatever the raster declares, since
/// channels are stored with 8 bits.
pub struct PPMImageWriter<T: Write> {
    writer: T,
}

impl<T: Write> PPMImageWriter<T> {
    pub fn new(writer: T) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> T {
        self.writer
    }

    fn write_magic(&mut self) -> io::Result<()> {
        write!(self.writer, "{}{}", MAGIC_TOKEN, LINE_TERMINATOR)
    }

    fn write_dimensions(&mut self, raster: &Raster) -> io::Result<()> {
        write!(
            self.writer,
            "{} {}{}",
            raster.width(),
            raster.height(),
            LINE_TERMINATOR
        )
    }

    fn write_max_value(&mut self) -> io::Result<()> {
        write!(self.writer, "{}{}", MAX_CHANNEL_VALUE, LINE_TERMINATOR)
    }

    fn write_row(&mut self, row: &[Pixel]) -> io::Result<()> {
        for (index, pixel) in row.iter().enumerate() {
            if index > 0 {
                self.writer.write_all(PIXEL_SEPARATOR.as_bytes())?;
            }
            write!(self.writer, "{}", pixel)?;
        }
        self.writer.write_all(LINE_TERMINATOR.as_bytes())
    }

    fn write_rows(&mut self, raster: &Raster) -> io::Result<()> {
        raster.rows().iter().try_for_each(|row| self.write_row(row))
    }
}

impl<T: Write> ImageWriter for PPMImageWriter<T> {
    type Error = EncodeError;

    fn write_image(&mut self, raster: &Raster) -> Result<(), EncodeError> {
        if raster.max_value() != MAX_CHANNEL_VALUE {
            log::debug!(
                "Writing max value {} in place of declared max value {}",
                MAX_CHANNEL_VALUE,
                raster.max_value()
            );
        }
        self.write_magic()?;
        self.write_dimensions(raster)?;
        self.write_max_value()?;
        self.write_rows(raster)?;
        self.writer.flush()?;
        Ok(())
    }
}

pub fn encode<W: Write>(raster: &Raster, writer: W) -> Result<(), EncodeError> {
    PPMImageWriter::new(writer).write_image(raster)
}
