pub mod data;
pub mod namelist;
pub mod value;
