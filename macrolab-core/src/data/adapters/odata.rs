//! Central bank OData endpoints (market expectations survey).
//!
//! The collection input is the full query URL; the service returns a CSV
//! whose `Mediana` column is the series value.

use super::{fetch_single, SourceAdapter};
use crate::data::error::{CollectionError, DataError};
use crate::data::fetcher::Fetcher;
use crate::data::parse::{parse_decimal, parse_flexible_date, read_csv, CsvOptions};
use crate::domain::{DateWindow, Observation, SeriesRequest, Source, TimeSeriesTable};

const OPTIONS: CsvOptions = CsvOptions {
    delimiter: b',',
    decimal: ',',
};

#[derive(Debug, Clone, Copy, Default)]
pub struct OdataAdapter;

impl SourceAdapter for OdataAdapter {
    fn source(&self) -> Source {
        Source::BcbOdata
    }

    fn collect(
        &self,
        fetcher: &Fetcher,
        request: &SeriesRequest,
        _span: DateWindow,
    ) -> Result<TimeSeriesTable, CollectionError> {
        let url = request.collection_input.trim();
        fetch_single(fetcher, request, url, |body| parse(body, &request.identifier))
    }
}

pub(crate) fn parse(body: &[u8], name: &str) -> Result<TimeSeriesTable, DataError> {
    let table = read_csv(body, OPTIONS)?;
    let date_col = table.column("Data")?;
    let value_col = table.column("Mediana")?;

    let rows = table
        .rows
        .iter()
        .map(|row| {
            let raw_date = table.cell(row, date_col);
            let date = parse_flexible_date(raw_date)
                .ok_or_else(|| DataError::Parse(format!("date '{raw_date}'")))?;
            Ok(Observation::new(date, parse_decimal(table.cell(row, value_col), ',')))
        })
        .collect::<Result<Vec<_>, DataError>>()?;

    Ok(TimeSeriesTable::new(name, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn reads_median_and_keeps_first_duplicate() {
        let body = b"Indicador,Data,DataReferencia,Mediana\n\
IPCA,2024-01-05,2024,\"3,90\"\n\
IPCA,2024-01-05,2025,\"3,50\"\n\
IPCA,2024-01-12T00:00:00,2024,\"3,87\"\n";
        let table = parse(body, "focus_ipca").unwrap();
        assert_eq!(table.len(), 2);
        let jan5 = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(table.get(jan5), Some(Some(3.90)));
    }

    #[test]
    fn missing_median_column() {
        let err = parse(b"Data,Media\n2024-01-05,\"1,0\"\n", "x").unwrap_err();
        assert!(matches!(err, DataError::MissingColumn { column } if column == "Mediana"));
    }
}
