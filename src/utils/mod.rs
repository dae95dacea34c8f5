pub mod date_utils;
pub mod db_utils;
pub mod employee_code_cache;
pub mod employee_code_filter;
pub mod pagination;
pub mod validators;
