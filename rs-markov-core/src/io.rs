use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::{env, fs, io};

use crate::Token;

/// Lazily reads a text file as a stream of whitespace-separated words.
///
/// - Reads line by line, never the whole file at once
/// - Empty lines and runs of whitespace yield nothing
/// - Bytes that are not valid UTF-8 are replaced with U+FFFD, so any
///   text encoding can be indexed
/// - A read failure comes out as an `Err` item; collecting into a
///   `Result` stops at the first one
pub fn read_words<P: AsRef<Path>>(filename: P) -> io::Result<impl Iterator<Item = io::Result<Token>>> {
	let reader = BufReader::new(File::open(filename)?);
	Ok(reader.split(b'\n').flat_map(|line| match line {
		Ok(line) => String::from_utf8_lossy(&line)
			.split_whitespace()
			.map(|w| Ok(w.to_owned()))
			.collect::<Vec<_>>(),
		Err(e) => vec![Err(e)],
	}))
}

/// Splits an in-memory text into words.
pub fn split_words(text: &str) -> Vec<Token> {
	text.split_whitespace().map(str::to_owned).collect()
}

/// Builds an output path based on an input path and a new extension.
///
/// Example:
/// `data/input.txt` + `"o3.bin"` → `data/input.o3.bin`
pub fn build_output_path<P: AsRef<Path>>(
	input_path: P,
	output_extension: &str,
) -> io::Result<PathBuf> {
	let input_path = input_path.as_ref();

	let parent = input_path.parent().unwrap_or_else(|| Path::new("."));
	let file_stem = input_path
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Input path has no filename"))?;

	let mut output = PathBuf::from(parent);
	output.push(file_stem);
	output.set_extension(output_extension);

	Ok(output)
}

/// Extracts the base filename without extension.
///
/// Examples:
/// - `"./data/alice.txt"` → `"alice"`
/// - `"alice.txt"` → `"alice"`
pub fn get_filename<P: AsRef<Path>>(input_path: P) -> io::Result<String> {
	let stem = input_path
		.as_ref()
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Path has no filename"))?;

	Ok(stem.to_string_lossy().to_string())
}

/// Normalize a folder path.
///
/// - `"."` or `"./"` resolves to the current working directory
/// - Other paths are returned as-is (not canonicalized)
pub fn normalize_folder(input: &str) -> PathBuf {
	if input == "." || input == "./" {
		env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
	} else {
		PathBuf::from(input)
	}
}

/// Lists all files with a given extension in a directory.
///
/// Returns file names only (no paths), sorted.
pub fn list_files<P: AsRef<Path>>(dir: P, extension: &str) -> io::Result<Vec<String>> {
	let mut files = Vec::new();

	for entry in fs::read_dir(dir)? {
		let path = entry?.path();

		if path.is_file() && path.extension() == Some(std::ffi::OsStr::new(extension)) {
			if let Some(name) = path.file_name() {
				files.push(name.to_string_lossy().to_string());
			}
		}
	}

	files.sort();
	Ok(files)
}

/// Returns true when `derived` exists and was modified after `source`.
///
/// Used to decide whether a cached artifact still reflects its source file.
pub fn is_up_to_date<P: AsRef<Path>, Q: AsRef<Path>>(derived: P, source: Q) -> bool {
	let modified = |p: &Path| fs::metadata(p).and_then(|m| m.modified());
	match (modified(derived.as_ref()), modified(source.as_ref())) {
		(Ok(derived), Ok(source)) => derived > source,
		_ => false,
	}
}
