//! Shared fixtures for the integration tests.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

pub const HEADER: &str = "month,town,flat_type,block,street_name,storey_range,floor_area_sqm,flat_model,lease_commence_date,remaining_lease,resale_price";

/// A data directory with two CSV files and one unparseable row.
pub fn data_dir() -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    write_csv(
        dir.path(),
        "2022-2023.csv",
        &[
            "2023-01,BEDOK,4 ROOM,101,BEDOK NTH AVE 1,04 TO 06,92,Model A,1980,56 years 03 months,400000",
            "2023-06,BEDOK,4 ROOM,102,BEDOK NTH AVE 1,07 TO 09,93,Model A,1980,55 years 09 months,500000",
            "2022-03,TAMPINES,5 ROOM,201,TAMPINES ST 21,10 TO 12,120,Improved,1990,67 years,600000",
            "2022-04,TAMPINES,5 ROOM,202,TAMPINES ST 21,01 TO 03,121,Improved,1990,67 years,not-a-price",
        ],
    );
    write_csv(
        dir.path(),
        "2021.csv",
        &["2021-05,ANG MO KIO,3 ROOM,301,ANG MO KIO AVE 3,04 TO 06,67,New Generation,1978,55 years,300000"],
    );
    dir
}

pub fn write_csv(dir: &Path, name: &str, rows: &[&str]) {
    let mut text = String::from(HEADER);
    text.push('\n');
    for row in rows {
        text.push_str(row);
        text.push('\n');
    }
    fs::write(dir.join(name), text).expect("write csv");
}
