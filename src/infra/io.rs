use memmap2::Mmap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::ExtractionError;

const MMAP_THRESHOLD: u64 = 1024 * 1024; // 1 MiB

/// Raw bytes of an essay input.
pub enum InputBytes
{
    Mapped(Mmap),
    Buffered(Vec<u8>),
}

impl AsRef<[u8]> for InputBytes
{
    fn as_ref(&self) -> &[u8]
    {
        match self
        {
            InputBytes::Mapped(mmap) => &mmap[..],
            InputBytes::Buffered(bytes) => bytes.as_slice(),
        }
    }
}

/// Expand `~` and `$VAR` in a user-supplied path.
pub fn expand_path(raw: &str) -> PathBuf
{
    match shellexpand::full(raw)
    {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        // Unknown variables: keep the path as typed
        Err(_) => PathBuf::from(raw),
    }
}

/// True when the file name says PDF.
pub fn has_pdf_extension(path: &Path) -> bool
{
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Read an input file, memory mapping large ones.
pub fn read_input<P: AsRef<Path>>(path: P) -> Result<InputBytes, ExtractionError>
{
    let path = path.as_ref();
    let io_err = |source: std::io::Error| ExtractionError::Io { origin: path.display().to_string(), source };

    let metadata = std::fs::metadata(path).map_err(io_err)?;

    if metadata.len() > MMAP_THRESHOLD
    {
        let file = File::open(path).map_err(io_err)?;

        // Safety: read-only mapping; the file must not be truncated while mapped
        let mmap = unsafe { Mmap::map(&file) }.map_err(io_err)?;

        Ok(InputBytes::Mapped(mmap))
    }
    else
    {
        let bytes = std::fs::read(path).map_err(io_err)?;

        Ok(InputBytes::Buffered(bytes))
    }
}

/// Read all of standard input.
pub fn read_stdin() -> Result<InputBytes, ExtractionError>
{
    let mut buf = Vec::new();
    std::io::stdin()
        .read_to_end(&mut buf)
        .map_err(|source| ExtractionError::Io { origin: "standard input".to_string(), source })?;

    Ok(InputBytes::Buffered(buf))
}
