use std::io::{self, BufRead};
use std::str::FromStr;

use super::super::{ImageReader, Raster, MAX_CHANNEL_VALUE};
use crate::color::Pixel;
use crate::error::DecodeError;

const MAGIC_TOKEN: &str = "P3";
const COMMENT_TOKEN: &str = "#";
const CHANNELS_PER_PIXEL: usize = 3;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Reject input that ends before every declared row was read.
    pub strict: bool,
}

/// Reads one P3 image from a line-oriented stream.
pub struct PPMImageReader<T: BufRead> {
    reader: T,
    options: DecodeOptions,
}

impl<T: BufRead> PPMImageReader<T> {
    pub fn new(reader: T) -> Self {
        Self::with_options(reader, DecodeOptions::default())
    }

    pub fn with_options(reader: T, options: DecodeOptions) -> Self {
        Self { reader, options }
    }
}

impl<T: BufRead> ImageReader for PPMImageReader<T> {
    type Error = DecodeError;

    fn read_image(&mut self) -> Result<Raster, DecodeError> {
        let mut lines = (&mut self.reader).lines();
        let mut parser = PPMParser::new(&mut lines, self.options);
        parser.parse_lines()
    }
}

pub fn decode<R: BufRead>(reader: R) -> Result<Raster, DecodeError> {
    PPMImageReader::new(reader).read_image()
}

pub fn decode_with_options<R: BufRead>(
    reader: R,
    options: DecodeOptions,
) -> Result<Raster, DecodeError> {
    PPMImageReader::with_options(reader, options).read_image()
}

enum LineContent {
    Pixels,
    Comment,
}

struct PPMParser<'a, T> {
    lines: &'a mut T,
    options: DecodeOptions,
}

impl<'a, T> PPMParser<'a, T>
where
    T: Iterator<Item = io::Result<String>>,
{
    fn new(lines: &'a mut T, options: DecodeOptions) -> Self {
        Self { lines, options }
    }

    fn parse_lines(&mut self) -> Result<Raster, DecodeError> {
        let magic = self.next_line()?.unwrap_or_default();
        Self::check_magic(magic)?;
        let (width, height) = self.parse_dimensions()?;
        let max_value = self.parse_max_value()?;
        log::debug!(
            "Decoding {}x{} image with max value {}",
            width,
            height,
            max_value
        );
        let mut raster = Raster::blank(width, height, max_value)
            .ok_or_else(|| DecodeError::BadDimensions(format!("{} {}", width, height)))?;
        let decoded_rows = self.parse_rows(&mut raster)?;
        self.check_all_rows_decoded(decoded_rows, height)?;
        Ok(raster)
    }

    fn next_line(&mut self) -> Result<Option<String>, DecodeError> {
        Ok(self.lines.next().transpose()?)
    }

    fn check_magic(line: String) -> Result<(), DecodeError> {
        if line != MAGIC_TOKEN {
            return Err(DecodeError::BadMagic(line));
        }
        Ok(())
    }

    fn parse_dimensions(&mut self) -> Result<(usize, usize), DecodeError> {
        let line = self.next_line()?.unwrap_or_default();
        let fields: Vec<&str> = line.split_whitespace().collect();
        let dimensions = match fields.as_slice() {
            [width, height] => Self::parse_dimension(width).zip(Self::parse_dimension(height)),
            _ => None,
        };
        dimensions.ok_or_else(|| DecodeError::BadDimensions(line.clone()))
    }

    fn parse_dimension(field: &str) -> Option<usize> {
        parse_decimal::<u32>(field)
            .filter(|dimension| *dimension > 0)
            .map(|dimension| dimension as usize)
    }

    fn parse_max_value(&mut self) -> Result<u8, DecodeError> {
        let line = self.next_line()?.unwrap_or_default();
        parse_decimal::<u32>(&line)
            .filter(|max_value| (1..=MAX_CHANNEL_VALUE as u32).contains(max_value))
            .map(|max_value| max_value as u8)
            .ok_or(DecodeError::BadMaxValue(line))
    }

    /// Fill `raster` row by row and return how many rows the input supplied.
    fn parse_rows(&mut self, raster: &mut Raster) -> Result<usize, DecodeError> {
        let mut row = 0;
        while row < raster.height() {
            let Some(line) = self.next_line()? else {
                break;
            };
            match Self::parse_row(&line, row, raster)? {
                LineContent::Pixels => row += 1,
                LineContent::Comment => log::debug!("Skipping comment line before row {}", row),
            }
        }
        Ok(row)
    }

    fn parse_row(
        line: &str,
        row: usize,
        raster: &mut Raster,
    ) -> Result<LineContent, DecodeError> {
        let max_value = raster.max_value();
        let tokens = line
            .split_whitespace()
            .take(CHANNELS_PER_PIXEL * raster.width());
        let mut channels = [0; CHANNELS_PER_PIXEL];
        for (index, token) in tokens.enumerate() {
            if token == COMMENT_TOKEN {
                return Ok(LineContent::Comment);
            }
            let column = index / CHANNELS_PER_PIXEL;
            let channel = index % CHANNELS_PER_PIXEL;
            channels[channel] = Self::parse_channel_value(token, max_value).ok_or_else(|| {
                DecodeError::BadPixelValue {
                    row,
                    column,
                    token: token.to_owned(),
                }
            })?;
            if channel == CHANNELS_PER_PIXEL - 1 {
                raster.put(column, row, Pixel::from(channels));
            }
        }
        Ok(LineContent::Pixels)
    }

    fn parse_channel_value(token: &str, max_value: u8) -> Option<u8> {
        parse_decimal::<u8>(token).filter(|value| *value <= max_value)
    }

    fn check_all_rows_decoded(
        &self,
        decoded_rows: usize,
        height: usize,
    ) -> Result<(), DecodeError> {
        if decoded_rows == height {
            return Ok(());
        }
        if self.options.strict {
            return Err(DecodeError::Truncated {
                expected_rows: height,
                decoded_rows,
            });
        }
        log::warn!(
            "Input ended after {} of {} rows, remaining rows are black",
            decoded_rows,
            height
        );
        Ok(())
    }
}

/// Parse an unsigned base-10 number made of ASCII digits only.
fn parse_decimal<N: FromStr>(field: &str) -> Option<N> {
    if field.is_empty() || !field.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

#[cfg(test)]
mod test {
    use super::{decode, decode_with_options, DecodeOptions};
    use crate::{color::Pixel, error::DecodeError, image::Raster};

    fn parse_ppm_lines(string: &str) -> Result<Raster, DecodeError> {
        decode(string.as_bytes())
    }

    #[test]
    fn read_string() {
        let string = "P3\n2 1\n255\n255 0 0\t0 255 0\n";
        let image = parse_ppm_lines(string).unwrap();
        assert_eq!(image.width(), 2);
        assert_eq!(image.height(), 1);
        assert_eq!(image.max_value(), 255);
        assert_eq!(
            image.rows(),
            &[vec![Pixel::new(255, 0, 0), Pixel::new(0, 255, 0)]]
        );
    }

    #[test]
    fn read_crlf_line_endings() {
        let string = "P3\r\n1 2\r\n255\r\n1 2 3\r\n4 5 6\r\n";
        let image = parse_ppm_lines(string).unwrap();
        assert_eq!(image.pixel(0, 1), Some(Pixel::new(4, 5, 6)));
    }

    #[test]
    fn reject_wrong_magic() {
        for string in ["P6\n1 1\n255\n0 0 0\n", " P3\n1 1\n255\n", "P3 \n1 1\n255\n", ""] {
            assert!(
                matches!(parse_ppm_lines(string), Err(DecodeError::BadMagic(_))),
                "magic of {:?} was accepted",
                string
            );
        }
    }

    #[test]
    fn reject_bad_dimensions() {
        for dimensions in ["1", "1 2 3", "a 2", "2 b", "0 1", "1 0", "-1 2", "+1 2", ""] {
            let string = format!("P3\n{}\n255\n", dimensions);
            assert!(
                matches!(parse_ppm_lines(&string), Err(DecodeError::BadDimensions(_))),
                "dimensions {:?} were accepted",
                dimensions
            );
        }
    }

    #[test]
    fn reject_dimensions_too_large_to_allocate() {
        let string = "P3\n4000000000 4000000000\n255\n0 0 0\n";
        match parse_ppm_lines(string) {
            Err(DecodeError::BadDimensions(line)) => assert_eq!(line, "4000000000 4000000000"),
            other => panic!("oversized dimensions gave {:?}", other),
        }
    }

    #[test]
    fn missing_dimensions_line() {
        assert!(matches!(
            parse_ppm_lines("P3\n"),
            Err(DecodeError::BadDimensions(_))
        ));
    }

    #[test]
    fn reject_bad_max_value() {
        for max_value in ["abc", "0", "256", "65535", " 255", "255 255", ""] {
            let string = format!("P3\n1 1\n{}\n0 0 0\n", max_value);
            assert!(
                matches!(parse_ppm_lines(&string), Err(DecodeError::BadMaxValue(_))),
                "max value {:?} was accepted",
                max_value
            );
        }
    }

    #[test]
    fn reject_bad_pixel_values() {
        for value in ["256", "-1", "x", "1.5"] {
            let string = format!("P3\n1 1\n255\n0 {} 0\n", value);
            match parse_ppm_lines(&string) {
                Err(DecodeError::BadPixelValue { row, column, token }) => {
                    assert_eq!((row, column), (0, 0));
                    assert_eq!(token, value);
                }
                other => panic!("pixel value {:?} gave {:?}", value, other),
            }
        }
    }

    #[test]
    fn reject_pixel_value_above_declared_max_value() {
        let string = "P3\n2 1\n100\n1 2 3 4 101 6\n";
        assert!(matches!(
            parse_ppm_lines(string),
            Err(DecodeError::BadPixelValue { column: 1, .. })
        ));
    }

    #[test]
    fn comment_line_does_not_advance_row() {
        let string = "P3\n1 1\n255\n#\n10 20 30\n";
        let image = parse_ppm_lines(string).unwrap();
        assert_eq!(image.rows(), &[vec![Pixel::new(10, 20, 30)]]);
    }

    #[test]
    fn comment_discards_rest_of_line() {
        let string = "P3\n2 2\n255\n1 1 1 # 9 9 9\n2 2 2 3 3 3\n4 4 4 5 5 5\n";
        let image = parse_ppm_lines(string).unwrap();
        assert_eq!(
            image.rows(),
            &[
                vec![Pixel::new(2, 2, 2), Pixel::new(3, 3, 3)],
                vec![Pixel::new(4, 4, 4), Pixel::new(5, 5, 5)],
            ]
        );
    }

    #[test]
    fn hash_glued_to_text_is_not_a_comment() {
        let string = "P3\n1 1\n255\n#note\n";
        assert!(matches!(
            parse_ppm_lines(string),
            Err(DecodeError::BadPixelValue { .. })
        ));
    }

    #[test]
    fn truncated_input_is_zero_padded() {
        let string = "P3\n1 3\n255\n1 2 3\n4 5 6\n";
        let image = parse_ppm_lines(string).unwrap();
        assert_eq!(image.height(), 3);
        assert_eq!(image.row(2), Some(&[Pixel::BLACK][..]));
        assert_eq!(image.pixel(0, 1), Some(Pixel::new(4, 5, 6)));
    }

    #[test]
    fn strict_decoding_rejects_truncated_input() {
        let string = "P3\n1 3\n255\n1 2 3\n4 5 6\n";
        match decode_with_options(string.as_bytes(), DecodeOptions { strict: true }) {
            Err(DecodeError::Truncated {
                expected_rows,
                decoded_rows,
            }) => {
                assert_eq!(expected_rows, 3);
                assert_eq!(decoded_rows, 2);
            }
            other => panic!("truncation not detected: {:?}", other),
        }
    }

    #[test]
    fn strict_decoding_accepts_complete_input() {
        let string = "P3\n1 1\n255\n#\n1 2 3\n";
        let image = decode_with_options(string.as_bytes(), DecodeOptions { strict: true }).unwrap();
        assert_eq!(image.pixel(0, 0), Some(Pixel::new(1, 2, 3)));
    }

    #[test]
    fn short_line_leaves_rest_of_row_black() {
        let string = "P3\n3 1\n255\n7 7 7 8 8\n";
        let image = parse_ppm_lines(string).unwrap();
        assert_eq!(
            image.rows(),
            &[vec![Pixel::new(7, 7, 7), Pixel::BLACK, Pixel::BLACK]]
        );
    }

    #[test]
    fn extra_tokens_on_a_line_are_ignored() {
        let string = "P3\n1 1\n255\n1 2 3 garbage #\n";
        let image = parse_ppm_lines(string).unwrap();
        assert_eq!(image.pixel(0, 0), Some(Pixel::new(1, 2, 3)));
    }

    #[test]
    fn empty_line_is_a_black_row() {
        let string = "P3\n1 2\n255\n\n9 9 9\n";
        let image = parse_ppm_lines(string).unwrap();
        assert_eq!(image.pixel(0, 0), Some(Pixel::BLACK));
        assert_eq!(image.pixel(0, 1), Some(Pixel::new(9, 9, 9)));
    }

    #[test]
    fn lines_after_last_row_are_ignored() {
        let string = "P3\n1 1\n255\n1 2 3\nnot pixels\n";
        assert!(parse_ppm_lines(string).is_ok());
    }

    #[test]
    fn invalid_utf8_is_an_io_error() {
        let bytes: &[u8] = b"P3\n1 1\n255\n\xff\xfe\n";
        assert!(matches!(decode(bytes), Err(DecodeError::Io(_))));
    }
}
