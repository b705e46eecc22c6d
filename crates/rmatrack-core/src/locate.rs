//! Row lookup by (RMA, serial) identity. A miss is "no update performed",
//! never a fatal error; duplicate identities resolve to the first match.

use crate::model::{RecordIdentity, ServiceRecord};
use crate::sheet::{columns, RawSheet};

/// Linear scan of the typed table. First match wins.
pub fn find_record<'a>(
    records: &'a [ServiceRecord],
    identity: &RecordIdentity,
) -> Option<(usize, &'a ServiceRecord)> {
    records
        .iter()
        .enumerate()
        .find(|(_, record)| identity.matches(record))
}

/// Linear scan of a raw sheet, applying the same identity rules to the
/// unnormalized RMA and S/N cells. Returns the row index.
pub fn find_row_in_sheet(sheet: &RawSheet, identity: &RecordIdentity) -> Option<usize> {
    let rma_col = sheet.column_index(columns::RMA);
    let serial_col = sheet.column_index(columns::SERIAL)?;

    sheet.rows.iter().position(|row| {
        let serial = row.get(serial_col).map(String::as_str).unwrap_or("");
        let rma = rma_col
            .and_then(|col| row.get(col))
            .map(String::as_str)
            .unwrap_or("");
        identity.matches_identity(&RecordIdentity::new(rma, serial))
    })
}
