use std::{
	fs,
	io::ErrorKind,
	path::PathBuf,
};

use log::*;
use phonegen::ValidatedNumber;

use super::{render_csv, DeliveryError};

/// Generated CSV files on local disk, served back through `/download`.
#[derive(Debug, Clone)]
pub struct CsvStore {
	dir: PathBuf,
}

impl CsvStore {
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self { dir: dir.into() }
	}

	/// Write `numbers` to a new file and return its name.
	pub fn save(&self, numbers: &[ValidatedNumber]) -> Result<String, DeliveryError> {
		fs::create_dir_all(&self.dir)?;
		let file_name = format!("phone_numbers_{}.csv", uuid::Uuid::new_v4());
		let path = self.dir.join(&file_name);
		fs::write(&path, render_csv(numbers))?;
		info!("Saved {} numbers to {}", numbers.len(), path.display());
		Ok(file_name)
	}

	pub fn open(&self, file_name: &str) -> Result<Vec<u8>, DeliveryError> {
		let path = self.resolve(file_name)?;
		debug!("reading {}", path.display());
		match fs::read(&path) {
			Ok(bytes) => Ok(bytes),
			Err(err) if err.kind() == ErrorKind::NotFound => Err(DeliveryError::NotFound),
			Err(err) => Err(err.into()),
		}
	}

	/// Only plain file names directly inside the storage directory are allowed.
	fn resolve(&self, file_name: &str) -> Result<PathBuf, DeliveryError> {
		let is_plain = !file_name.is_empty()
			&& !file_name.starts_with('.')
			&& !file_name.contains(|c: char| c == '/' || c == '\\' || c == '\0');
		if !is_plain {
			return Err(DeliveryError::InvalidFileName(file_name.to_owned()));
		}
		Ok(self.dir.join(file_name))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use phonegen::LineType;

	fn numbers() -> Vec<ValidatedNumber> {
		["+447400123456", "+447400654321"]
			.iter()
			.map(|n| ValidatedNumber {
				phone_number: n.to_string(),
				valid: true,
				carrier: "Unknown".into(),
				line_type: LineType::Unknown,
			})
			.collect()
	}

	#[test]
	fn test_save_then_open() -> anyhow::Result<()> {
		let tmp = tempfile::tempdir()?;
		let store = CsvStore::new(tmp.path().join("generated_files"));
		let file_name = store.save(&numbers())?;
		assert!(file_name.starts_with("phone_numbers_"));
		assert!(file_name.ends_with(".csv"));

		let contents = String::from_utf8(store.open(&file_name)?)?;
		assert_eq!(contents, "Phone Number\n+447400123456\n+447400654321\n");
		Ok(())
	}

	#[test]
	fn test_each_save_gets_a_new_file() -> anyhow::Result<()> {
		let tmp = tempfile::tempdir()?;
		let store = CsvStore::new(tmp.path());
		let a = store.save(&numbers())?;
		let b = store.save(&numbers())?;
		assert_ne!(a, b);
		Ok(())
	}

	#[test]
	fn test_open_missing_file() {
		let tmp = tempfile::tempdir().unwrap();
		let store = CsvStore::new(tmp.path());
		assert!(matches!(
			store.open("phone_numbers_nope.csv"),
			Err(DeliveryError::NotFound)
		));
	}

	#[test]
	fn test_rejects_path_traversal() {
		let tmp = tempfile::tempdir().unwrap();
		let store = CsvStore::new(tmp.path());
		for name in ["../secret.csv", "..", "", "a/b.csv", "a\\b.csv", ".hidden"] {
			assert!(
				matches!(store.open(name), Err(DeliveryError::InvalidFileName(_))),
				"{:?}",
				name
			);
		}
	}
}
