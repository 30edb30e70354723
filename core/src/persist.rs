use crate::{DateLookup, DocId, PostingStore, SearchIndex};
use anyhow::{anyhow, bail, Context, Result};
use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fs::{create_dir_all, File};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 1;

const META_FILE: &str = "meta.json";
const POSTINGS_FILE: &str = "postings.bin";
const DATES_FILE: &str = "id_to_date.txt";
const DOCS_DIR: &str = "docs";

/// Universe size and provenance of an index directory.
#[derive(Debug, Serialize, Deserialize)]
pub struct IndexMeta {
    pub num_docs: u32,
    pub created_at: String,
    pub version: u32,
}

impl IndexMeta {
    pub fn new(num_docs: u32, created_at: impl Into<String>) -> Self {
        Self { num_docs, created_at: created_at.into(), version: FORMAT_VERSION }
    }
}

/// Locations of the index artifacts under one root directory.
pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn file(&self, name: &str) -> PathBuf { self.root.join(name) }
    pub fn docs_dir(&self) -> PathBuf { self.file(DOCS_DIR) }
}

pub fn save_meta(paths: &IndexPaths, meta: &IndexMeta) -> Result<()> {
    create_dir_all(&paths.root)?;
    let w = BufWriter::new(File::create(paths.file(META_FILE))?);
    serde_json::to_writer_pretty(w, meta)?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<IndexMeta> {
    let path = paths.file(META_FILE);
    let f = File::open(&path).with_context(|| format!("opening {}", path.display()))?;
    let meta: IndexMeta = serde_json::from_reader(BufReader::new(f))
        .with_context(|| format!("parsing {}", path.display()))?;
    if meta.version > FORMAT_VERSION {
        bail!("index format version {} is newer than supported version {FORMAT_VERSION}", meta.version);
    }
    Ok(meta)
}

/// Write the term table as bincode `term -> portable roaring bytes`.
pub fn save_postings<'a, I>(paths: &IndexPaths, postings: I) -> Result<()>
where
    I: IntoIterator<Item = (&'a str, &'a RoaringBitmap)>,
{
    create_dir_all(&paths.root)?;
    let mut table: HashMap<&str, Vec<u8>> = HashMap::new();
    for (term, set) in postings {
        let mut bytes = Vec::with_capacity(set.serialized_size());
        set.serialize_into(&mut bytes)?;
        table.insert(term, bytes);
    }
    let mut f = File::create(paths.file(POSTINGS_FILE))?;
    let bytes = bincode::serialize(&table)?;
    f.write_all(&bytes)?;
    Ok(())
}

/// Read the term table and check every id lies in `[0, num_docs)`.
pub fn load_postings(paths: &IndexPaths, num_docs: u32) -> Result<PostingStore> {
    let path = paths.file(POSTINGS_FILE);
    let mut f = File::open(&path).with_context(|| format!("opening {}", path.display()))?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    let table: HashMap<String, Vec<u8>> = bincode::deserialize(&buf)?;

    let mut terms = Vec::with_capacity(table.len());
    for (term, bytes) in table {
        let set = RoaringBitmap::deserialize_from(&bytes[..])
            .with_context(|| format!("decoding postings for term {term:?}"))?;
        if let Some(max) = set.max() {
            if max >= num_docs {
                bail!("postings for term {term:?} contain doc {max}, outside universe of {num_docs}");
            }
        }
        terms.push((term, set));
    }
    Ok(PostingStore::new(num_docs, terms))
}

/// Write the date table, one `id<TAB>date` record per line, in id order.
pub fn save_dates(paths: &IndexPaths, dates: &DateLookup) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut w = BufWriter::new(File::create(paths.file(DATES_FILE))?);
    for (doc_id, date) in dates.iter() {
        writeln!(w, "{doc_id}\t{date}")?;
    }
    w.flush()?;
    Ok(())
}

pub fn load_dates(paths: &IndexPaths, num_docs: u32) -> Result<DateLookup> {
    let path = paths.file(DATES_FILE);
    let f = File::open(&path).with_context(|| format!("opening {}", path.display()))?;
    parse_dates(BufReader::new(f), num_docs)
}

fn parse_dates<R: BufRead>(reader: R, num_docs: u32) -> Result<DateLookup> {
    let mut dates = DateLookup::with_universe(num_docs);
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() { continue; }
        let (id, date) = line
            .split_once('\t')
            .ok_or_else(|| anyhow!("id_to_date line {}: expected `id<TAB>date`", lineno + 1))?;
        let doc_id: DocId = id
            .trim()
            .parse()
            .with_context(|| format!("id_to_date line {}: bad doc id {id:?}", lineno + 1))?;
        if doc_id >= num_docs {
            bail!("id_to_date line {}: doc {doc_id} outside universe of {num_docs}", lineno + 1);
        }
        dates.set(doc_id, date.trim());
    }
    Ok(dates)
}

pub fn save_document(paths: &IndexPaths, doc_id: DocId, doc: &Value) -> Result<()> {
    let dir = paths.docs_dir();
    create_dir_all(&dir)?;
    let f = File::create(dir.join(format!("{doc_id}.json")))?;
    serde_json::to_writer(BufWriter::new(f), doc)?;
    Ok(())
}

/// Load everything a query needs: meta, postings and dates.
pub fn load_index(paths: &IndexPaths) -> Result<SearchIndex> {
    let meta = load_meta(paths)?;
    let postings = load_postings(paths, meta.num_docs)?;
    let dates = load_dates(paths, meta.num_docs)?;
    let missing = meta.num_docs as usize - dates.len();
    if missing > 0 {
        tracing::warn!(missing, "date table does not cover every document");
    }
    tracing::info!(num_docs = meta.num_docs, num_terms = postings.num_terms(), "loaded index");
    Ok(SearchIndex::new(postings, dates))
}
