use crate::model::error::io::IOError;
use crate::model::error::Error;
use std::fs::{self, File, FileTimes};
use std::path::Path;

/// Carries access and modification times over to a copied file.
/// Permission bits are already preserved by `fs::copy`.
pub fn copy_attributes(source: &Path, destination: &Path) -> Result<(), Error> {
    let metadata =
        fs::metadata(source).map_err(|err| IOError::GetMetadataFailed(source, err))?;

    let mut times = FileTimes::new();
    if let Ok(accessed) = metadata.accessed() {
        times = times.set_accessed(accessed);
    }
    if let Ok(modified) = metadata.modified() {
        times = times.set_modified(modified);
    }

    let file = File::options()
        .write(true)
        .open(destination)
        .or_else(|_| File::open(destination))
        .map_err(|err| IOError::SetMetadataFailed(destination, err))?;
    file.set_times(times)
        .map_err(|err| IOError::SetMetadataFailed(destination, err))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::copy_attributes;
    use std::fs::{self, File, FileTimes};
    use std::time::{Duration, SystemTime};

    #[test]
    fn modification_time_follows_source() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = dir.path().join("a.txt");
        let destination = dir.path().join("b.txt");
        fs::write(&source, b"alpha").expect("write source");
        fs::write(&destination, b"alpha").expect("write destination");

        let past = SystemTime::now() - Duration::from_secs(86_400);
        File::options()
            .write(true)
            .open(&source)
            .expect("open source")
            .set_times(FileTimes::new().set_modified(past))
            .expect("set source time");

        copy_attributes(&source, &destination).expect("copy attributes");

        let source_time = fs::metadata(&source).and_then(|m| m.modified()).expect("source mtime");
        let destination_time = fs::metadata(&destination)
            .and_then(|m| m.modified())
            .expect("destination mtime");
        assert_eq!(source_time, destination_time);
    }
}
