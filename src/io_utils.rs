//! File access for sheet exports: delimited text in, delimited text out,
//! with `-` standing for stdin/stdout and `encoding_rs` handling non-UTF-8
//! encodings on both sides.

use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use encoding_rs::{Encoding, UTF_8};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    match label {
        Some(value) => Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'")),
        None => Ok(UTF_8),
    }
}

/// Explicit delimiter if given, otherwise tab for `.tsv` paths and comma for the rest.
pub fn resolve_delimiter(path: Option<&Path>, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| {
        match path.and_then(|p| p.extension()).and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
            _ => DEFAULT_CSV_DELIMITER,
        }
    })
}

fn open_input(path: &Path) -> Result<Box<dyn Read>> {
    if is_dash(path) {
        return Ok(Box::new(io::stdin().lock()));
    }
    let file = File::open(path).with_context(|| format!("Opening input file {path:?}"))?;
    Ok(Box::new(BufReader::new(file)))
}

/// Reads every record of a delimited file as decoded text fields. No row is
/// treated as a header and rows may differ in width, like a sheet's used range.
pub fn read_records(
    path: &Path,
    delimiter: u8,
    encoding: &'static Encoding,
    limit: Option<usize>,
) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true)
        .from_reader(open_input(path)?);
    let mut rows = Vec::new();
    for (index, record) in reader.byte_records().enumerate() {
        if limit.is_some_and(|max| rows.len() >= max) {
            break;
        }
        let record = record.with_context(|| format!("Reading row {} of {path:?}", index + 1))?;
        let fields = record
            .iter()
            .map(|field| decode_field(field, encoding))
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("Decoding row {} of {path:?}", index + 1))?;
        rows.push(fields);
    }
    Ok(rows)
}

pub fn decode_field(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ));
    }
    Ok(text.into_owned())
}

/// Writes rows as delimited text, transcoding from UTF-8 when another encoding is requested.
pub fn write_records<I, R>(
    path: Option<&Path>,
    delimiter: u8,
    encoding: &'static Encoding,
    rows: I,
) -> Result<()>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator,
    R::Item: AsRef<[u8]>,
{
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .double_quote(true)
        .from_writer(Vec::new());
    for row in rows {
        writer.write_record(row).context("Formatting output row")?;
    }
    let buffer = writer
        .into_inner()
        .map_err(|err| anyhow!("Flushing output rows: {}", err.error()))?;

    let bytes = if encoding == UTF_8 {
        buffer
    } else {
        let text = String::from_utf8(buffer).context("Output rows are not valid UTF-8")?;
        let (encoded, _, had_errors) = encoding.encode(&text);
        if had_errors {
            return Err(anyhow!("Failed to encode output using {}", encoding.name()));
        }
        encoded.into_owned()
    };

    let mut sink: Box<dyn Write> = match path {
        Some(p) if !is_dash(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        _ => Box::new(io::stdout().lock()),
    };
    sink.write_all(&bytes).context("Writing output rows")?;
    sink.flush().context("Flushing output")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delimiter_follows_extension() {
        assert_eq!(resolve_delimiter(Some(Path::new("a.tsv")), None), b'\t');
        assert_eq!(resolve_delimiter(Some(Path::new("a.csv")), None), b',');
        assert_eq!(resolve_delimiter(None, Some(b';')), b';');
    }

    #[test]
    fn unknown_encodings_are_rejected() {
        assert!(resolve_encoding(Some("utf-8")).is_ok());
        assert_eq!(resolve_encoding(Some("latin1")).unwrap().name(), "windows-1252");
        assert!(resolve_encoding(Some("klingon")).is_err());
    }

    #[test]
    fn ragged_rows_are_read_and_limited() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ragged.csv");
        std::fs::write(&path, "a,b,c\n1,2\n3,4,5,6\n").unwrap();
        let rows = read_records(&path, b',', UTF_8, None).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1], vec!["1", "2"]);
        assert_eq!(rows[2].len(), 4);
        let limited = read_records(&path, b',', UTF_8, Some(2)).unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[test]
    fn output_is_transcoded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let encoding = resolve_encoding(Some("latin1")).unwrap();
        write_records(Some(&path), b',', encoding, vec![vec!["café", "x"]]).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes, b"caf\xe9,x\n");
    }
}
