use std::{
    collections::HashSet,
    ffi::OsString,
    fs::{self, File, OpenOptions},
    io::{BufReader, BufWriter},
    path::{Path, PathBuf},
    sync::mpsc,
};

use threadpool::ThreadPool;

pub use cli::CLIParser;
pub use color::Pixel;
pub use error::{DecodeError, EncodeError, Error, RasterError};
pub use image::{
    reader::ppm::{decode, decode_with_options, DecodeOptions, PPMImageReader},
    writer::ppm::{encode, PPMImageWriter},
    ImageReader, ImageWriter, Raster, MAX_CHANNEL_VALUE,
};

mod cli;
mod color;
mod error;
mod image;
mod logger;

pub type Result<T> = std::result::Result<T, error::Error>;

const TEMPORARY_FILE_SUFFIX: &str = ".tmp";

pub struct Arguments {
    input_files: Vec<PathBuf>,
    output_directory: PathBuf,
    number_of_threads: usize,
    strict: bool,
}

fn path_to_string(file_path: &Path) -> String {
    file_path.display().to_string()
}

fn open_input_file(file_path: &Path) -> Result<File> {
    File::open(file_path)
        .map_err(|e| Error::UnableToOpenInputFileForReading(path_to_string(file_path), e))
}

fn open_output_file(file_path: &Path) -> Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(file_path)
        .map_err(|e| Error::UnableToOpenOutputFileForWriting(path_to_string(file_path), e))
}

fn temporary_path(file_path: &Path) -> PathBuf {
    let mut temporary_path = OsString::from(file_path.as_os_str());
    temporary_path.push(TEMPORARY_FILE_SUFFIX);
    PathBuf::from(temporary_path)
}

fn output_path(input_file: &Path, output_directory: &Path) -> Result<PathBuf> {
    input_file
        .file_name()
        .map(|file_name| output_directory.join(file_name))
        .ok_or_else(|| Error::InputFileHasNoFileName(path_to_string(input_file)))
}

/// Every input must map to its own output file, otherwise one result overwrites another.
fn check_distinct_output_files(input_files: &[PathBuf], output_directory: &Path) -> Result<()> {
    let mut output_files = HashSet::with_capacity(input_files.len());
    for input_file in input_files {
        let output_file = output_path(input_file, output_directory)?;
        if !output_files.insert(output_file.clone()) {
            return Err(Error::DuplicateOutputFile(path_to_string(&output_file)));
        }
    }
    Ok(())
}

fn write_ppm_file(raster: &Raster, output_file: &Path) -> Result<()> {
    let temporary_file = temporary_path(output_file);
    let writer = BufWriter::new(open_output_file(&temporary_file)?);
    let result = encode(raster, writer)
        .map_err(|e| Error::EncodingFailed(path_to_string(output_file), e))
        .and_then(|_| {
            fs::rename(&temporary_file, output_file).map_err(|e| {
                Error::UnableToMoveOutputFileIntoPlace(path_to_string(output_file), e)
            })
        });
    if result.is_err() {
        // the partial file is useless either way
        let _ = fs::remove_file(&temporary_file);
    }
    result
}

/// Decode one file and write it back out under the same name in `output_directory`.
pub fn recode_ppm_file(
    input_file: &Path,
    output_directory: &Path,
    options: DecodeOptions,
) -> Result<PathBuf> {
    let output_file = output_path(input_file, output_directory)?;
    let reader = BufReader::new(open_input_file(input_file)?);
    let raster = decode_with_options(reader, options)
        .map_err(|e| Error::DecodingFailed(path_to_string(input_file), e))?;
    log::info!(
        "Decoded '{}' ({}x{})",
        input_file.display(),
        raster.width(),
        raster.height()
    );
    write_ppm_file(&raster, &output_file)?;
    log::info!("Wrote '{}'", output_file.display());
    Ok(output_file)
}

/// Re-encode every input file on a thread pool.
///
/// Returns the written paths in input order, or the first failure in input order.
pub fn recode_ppm_files(arguments: &Arguments) -> Result<Vec<PathBuf>> {
    check_distinct_output_files(&arguments.input_files, &arguments.output_directory)?;
    let threadpool = ThreadPool::new(arguments.number_of_threads.max(1));
    let options = DecodeOptions {
        strict: arguments.strict,
    };
    let (sender, receiver) = mpsc::channel();
    for (index, input_file) in arguments.input_files.iter().enumerate() {
        let sender = sender.clone();
        let input_file = input_file.clone();
        let output_directory = arguments.output_directory.clone();
        threadpool.execute(move || {
            let result = recode_ppm_file(&input_file, &output_directory, options);
            // the receiver outlives every job
            let _ = sender.send((index, result));
        });
    }
    drop(sender);

    let mut results: Vec<Option<Result<PathBuf>>> =
        arguments.input_files.iter().map(|_| None).collect();
    for (index, result) in receiver {
        results[index] = Some(result);
    }
    results
        .into_iter()
        .zip(&arguments.input_files)
        .map(|(result, input_file)| {
            result.unwrap_or_else(|| Err(Error::WorkerVanished(path_to_string(input_file))))
        })
        .collect()
}

#[cfg(test)]
mod test {
    use std::path::{Path, PathBuf};

    use super::{check_distinct_output_files, output_path, temporary_path};
    use crate::Error;

    #[test]
    fn temporary_path_appends_suffix() {
        let path = temporary_path(Path::new("/images/picture.ppm"));
        assert_eq!(path, PathBuf::from("/images/picture.ppm.tmp"));
    }

    #[test]
    fn output_path_keeps_file_name() {
        let path = output_path(Path::new("/in/picture.ppm"), Path::new("/out")).unwrap();
        assert_eq!(path, PathBuf::from("/out/picture.ppm"));
    }

    #[test]
    fn output_path_needs_file_name() {
        assert!(matches!(
            output_path(Path::new("/"), Path::new("/out")),
            Err(Error::InputFileHasNoFileName(_))
        ));
    }

    #[test]
    fn same_file_name_in_different_directories_collides() {
        let input_files = vec![
            PathBuf::from("/first/picture.ppm"),
            PathBuf::from("/second/picture.ppm"),
        ];
        match check_distinct_output_files(&input_files, Path::new("/out")) {
            Err(Error::DuplicateOutputFile(path)) => {
                assert_eq!(PathBuf::from(path), PathBuf::from("/out/picture.ppm"))
            }
            other => panic!("collision not detected: {:?}", other),
        }
    }

    #[test]
    fn distinct_file_names_do_not_collide() {
        let input_files = vec![
            PathBuf::from("/first/picture.ppm"),
            PathBuf::from("/first/other.ppm"),
        ];
        assert!(check_distinct_output_files(&input_files, Path::new("/out")).is_ok());
    }
}
