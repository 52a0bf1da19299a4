//! Parquet frame store.
//!
//! Layout: `{dir}/{stem}.parquet` with a `{dir}/{stem}.meta.json` sidecar,
//! one pair per frequency (`df_diaria`, `df_mensal`, ...).
//!
//! Writes are atomic (write to `.tmp`, rename into place). The sidecar
//! records the date range, columns and a BLAKE3 hash of the frame content.

use super::error::DataError;
use super::harmonize::WideFrame;
use crate::domain::Frequency;
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Name of the date column in every stored frame.
pub const DATE_COLUMN: &str = "date";

/// Metadata sidecar for a stored frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameMeta {
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub row_count: usize,
    pub columns: Vec<String>,
    pub data_hash: String,
    pub written_at: chrono::NaiveDateTime,
}

/// Stored state of one frequency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameStatus {
    pub frequency: Frequency,
    pub path: PathBuf,
    pub meta: Option<FrameMeta>,
}

impl FrameStatus {
    pub fn stored(&self) -> bool {
        self.meta.is_some()
    }
}

pub struct FrameStore {
    dir: PathBuf,
}

impl FrameStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn frame_path(&self, frequency: Frequency) -> PathBuf {
        self.dir.join(format!("{}.parquet", frequency.file_stem()))
    }

    fn meta_path(&self, frequency: Frequency) -> PathBuf {
        self.dir.join(format!("{}.meta.json", frequency.file_stem()))
    }

    /// Write one frame. Empty frames are not written (`Ok(None)`).
    pub fn write(&self, frame: &WideFrame) -> Result<Option<FrameMeta>, DataError> {
        let (Some(&start_date), Some(&end_date)) = (frame.dates.first(), frame.dates.last())
        else {
            debug!(frequency = %frame.frequency, "empty frame not written");
            return Ok(None);
        };

        fs::create_dir_all(&self.dir)
            .map_err(|e| DataError::Store(format!("create {}: {e}", self.dir.display())))?;

        let mut df = frame_to_dataframe(frame)?;
        let path = self.frame_path(frame.frequency);
        let tmp_path = path.with_extension("parquet.tmp");
        write_parquet(&mut df, &tmp_path)?;
        rename_into_place(&tmp_path, &path)?;

        let meta = FrameMeta {
            frequency: frame.frequency,
            start_date,
            end_date,
            row_count: frame.height(),
            columns: frame.columns.iter().map(|(name, _)| name.clone()).collect(),
            data_hash: content_hash(frame)?,
            written_at: chrono::Local::now().naive_local(),
        };
        let meta_json = serde_json::to_string_pretty(&meta)
            .map_err(|e| DataError::Store(format!("meta serialization: {e}")))?;
        let meta_path = self.meta_path(frame.frequency);
        let meta_tmp = meta_path.with_extension("json.tmp");
        fs::write(&meta_tmp, meta_json)
            .map_err(|e| DataError::Store(format!("meta write: {e}")))?;
        rename_into_place(&meta_tmp, &meta_path)?;

        info!(
            frequency = %frame.frequency,
            path = %path.display(),
            rows = meta.row_count,
            columns = meta.columns.len(),
            "frame written"
        );
        Ok(Some(meta))
    }

    /// Write every frame, returning the sidecars of those actually written.
    pub fn write_all(
        &self,
        frames: &BTreeMap<Frequency, WideFrame>,
    ) -> Result<Vec<FrameMeta>, DataError> {
        let mut written = Vec::new();
        for frame in frames.values() {
            if let Some(meta) = self.write(frame)? {
                written.push(meta);
            }
        }
        Ok(written)
    }

    /// Load a stored frame, validating its `date` column.
    pub fn load(&self, frequency: Frequency) -> Result<WideFrame, DataError> {
        let path = self.frame_path(frequency);
        if !path.exists() {
            return Err(DataError::NoStoredFrame { frequency });
        }
        let file = fs::File::open(&path).map_err(|e| DataError::Store(format!("open: {e}")))?;
        let df = ParquetReader::new(file)
            .finish()
            .map_err(|e| DataError::Store(format!("read parquet: {e}")))?;
        dataframe_to_frame(frequency, &df)
    }

    pub fn get_meta(&self, frequency: Frequency) -> Option<FrameMeta> {
        let content = fs::read_to_string(self.meta_path(frequency)).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Sidecar of every frequency, stored or not.
    pub fn status(&self) -> Vec<FrameStatus> {
        Frequency::ALL
            .iter()
            .map(|&frequency| FrameStatus {
                frequency,
                path: self.frame_path(frequency),
                meta: self.get_meta(frequency),
            })
            .collect()
    }
}

/// BLAKE3 over the JSON encoding of the frame.
pub fn content_hash(frame: &WideFrame) -> Result<String, DataError> {
    let bytes = serde_json::to_vec(frame)
        .map_err(|e| DataError::Store(format!("hash serialization: {e}")))?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

fn rename_into_place(tmp: &Path, path: &Path) -> Result<(), DataError> {
    fs::rename(tmp, path).map_err(|e| {
        let _ = fs::remove_file(tmp);
        DataError::Store(format!("atomic rename to {} failed: {e}", path.display()))
    })
}

// ── Parquet I/O helpers ─────────────────────────────────────────────

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}

fn frame_to_dataframe(frame: &WideFrame) -> Result<DataFrame, DataError> {
    let epoch = epoch();
    let days: Vec<i32> = frame
        .dates
        .iter()
        .map(|d| (*d - epoch).num_days() as i32)
        .collect();

    let mut columns = Vec::with_capacity(frame.width() + 1);
    columns.push(
        Column::new(DATE_COLUMN.into(), days)
            .cast(&DataType::Date)
            .map_err(|e| DataError::Store(format!("date cast: {e}")))?,
    );
    for (name, values) in &frame.columns {
        if name == DATE_COLUMN {
            return Err(DataError::Store(format!(
                "series name '{DATE_COLUMN}' collides with the date column"
            )));
        }
        columns.push(Column::new(name.as_str().into(), values.clone()));
    }

    DataFrame::new(columns).map_err(|e| DataError::Store(format!("dataframe creation: {e}")))
}

fn write_parquet(df: &mut DataFrame, path: &Path) -> Result<(), DataError> {
    let file = fs::File::create(path).map_err(|e| DataError::Store(format!("create file: {e}")))?;
    ParquetWriter::new(file)
        .finish(df)
        .map_err(|e| DataError::Store(format!("write parquet: {e}")))?;
    Ok(())
}

fn dataframe_to_frame(frequency: Frequency, df: &DataFrame) -> Result<WideFrame, DataError> {
    let dates = df
        .column(DATE_COLUMN)
        .map_err(|_| DataError::Validation(format!("missing column '{DATE_COLUMN}'")))?
        .date()
        .map_err(|e| DataError::Validation(format!("date column type: {e}")))?;

    let epoch = epoch();
    let dates = (0..df.height())
        .map(|i| {
            dates
                .get(i)
                .map(|days| epoch + chrono::Duration::days(i64::from(days)))
                .ok_or_else(|| DataError::Validation(format!("null date at row {i}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut columns = Vec::new();
    for column in df.get_columns() {
        let name = column.name().as_str();
        if name == DATE_COLUMN {
            continue;
        }
        let cast = column
            .cast(&DataType::Float64)
            .map_err(|e| DataError::Validation(format!("column '{name}': {e}")))?;
        let values = cast
            .f64()
            .map_err(|e| DataError::Validation(format!("column '{name}': {e}")))?;
        columns.push((name.to_string(), (0..df.height()).map(|i| values.get(i)).collect()));
    }

    Ok(WideFrame {
        frequency,
        dates,
        columns,
    })
}
