use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::attendance::{DATE_FORMAT, TIME_FORMAT};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\d\s\-\+\(\)]{10,20}$").expect("valid phone regex"));

/// Empty values are accepted; email is optional.
pub fn validate_email(email: &str) -> bool {
    email.is_empty() || EMAIL_RE.is_match(email)
}

/// Empty values are accepted; phone is optional.
pub fn validate_phone(phone: &str) -> bool {
    phone.is_empty() || PHONE_RE.is_match(phone)
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}

pub fn parse_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, TIME_FORMAT).ok()
}

fn filled(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub struct EmployeeInput<'a> {
    pub employee_id: Option<&'a str>,
    pub name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub hire_date: Option<&'a str>,
}

pub fn validate_employee(input: &EmployeeInput<'_>) -> Vec<String> {
    let mut errors = Vec::new();

    if filled(input.employee_id).is_none() {
        errors.push("Employee ID is required".to_string());
    }
    if filled(input.name).is_none() {
        errors.push("Name is required".to_string());
    }
    if let Some(email) = filled(input.email) {
        if !validate_email(email) {
            errors.push("Invalid email format".to_string());
        }
    }
    if let Some(phone) = filled(input.phone) {
        if !validate_phone(phone) {
            errors.push("Invalid phone number format".to_string());
        }
    }
    if let Some(hire_date) = filled(input.hire_date) {
        if parse_date(hire_date).is_none() {
            errors.push("Invalid hire date format. Use YYYY-MM-DD".to_string());
        }
    }

    errors
}

pub struct AttendanceInput<'a> {
    pub employee_id: Option<&'a str>,
    pub date: Option<&'a str>,
    pub check_in_time: Option<&'a str>,
    pub check_out_time: Option<&'a str>,
}

pub fn validate_attendance(input: &AttendanceInput<'_>) -> Vec<String> {
    let mut errors = Vec::new();

    if filled(input.employee_id).is_none() {
        errors.push("Employee ID is required".to_string());
    }

    match filled(input.date) {
        None => errors.push("Date is required".to_string()),
        Some(date) if parse_date(date).is_none() => {
            errors.push("Invalid date format. Use YYYY-MM-DD".to_string())
        }
        Some(_) => {}
    }

    let check_in = filled(input.check_in_time);
    let check_out = filled(input.check_out_time);

    if let Some(t) = check_in {
        if parse_time(t).is_none() {
            errors.push("Invalid check-in time format. Use HH:MM:SS".to_string());
        }
    }
    if let Some(t) = check_out {
        if parse_time(t).is_none() {
            errors.push("Invalid check-out time format. Use HH:MM:SS".to_string());
        }
    }

    if let (Some(Some(i)), Some(Some(o))) = (check_in.map(parse_time), check_out.map(parse_time)) {
        if o < i {
            errors.push("Check-out time cannot be before check-in time".to_string());
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails() {
        assert!(validate_email("jane.doe+hr@company.co"));
        assert!(validate_email(""));
        assert!(!validate_email("jane@company"));
        assert!(!validate_email("not an email"));
    }

    #[test]
    fn phones() {
        assert!(validate_phone("+880 1712-345678"));
        assert!(validate_phone("(555) 123-4567"));
        assert!(!validate_phone("12345"));
        assert!(!validate_phone("555-CALL-NOW"));
    }

    #[test]
    fn employee_requires_code_and_name() {
        let errors = validate_employee(&EmployeeInput {
            employee_id: Some("  "),
            name: None,
            email: Some("bad"),
            phone: None,
            hire_date: Some("01/02/2024"),
        });

        assert_eq!(
            errors,
            vec![
                "Employee ID is required",
                "Name is required",
                "Invalid email format",
                "Invalid hire date format. Use YYYY-MM-DD",
            ]
        );
    }

    #[test]
    fn valid_employee_passes() {
        let errors = validate_employee(&EmployeeInput {
            employee_id: Some("EMP-001"),
            name: Some("Jane Doe"),
            email: Some("jane@company.com"),
            phone: Some("+8801712345678"),
            hire_date: Some("2024-01-01"),
        });

        assert!(errors.is_empty());
    }

    #[test]
    fn attendance_checks_formats() {
        let errors = validate_attendance(&AttendanceInput {
            employee_id: Some("EMP-001"),
            date: Some("2026-02-30"),
            check_in_time: Some("9:00"),
            check_out_time: Some("18:00:00"),
        });

        assert_eq!(
            errors,
            vec![
                "Invalid date format. Use YYYY-MM-DD",
                "Invalid check-in time format. Use HH:MM:SS",
            ]
        );
    }

    #[test]
    fn attendance_rejects_inverted_times() {
        let errors = validate_attendance(&AttendanceInput {
            employee_id: Some("EMP-001"),
            date: Some("2026-03-10"),
            check_in_time: Some("18:00:00"),
            check_out_time: Some("09:00:00"),
        });

        assert_eq!(errors, vec!["Check-out time cannot be before check-in time"]);
    }

    #[test]
    fn attendance_requires_employee_and_date() {
        let errors = validate_attendance(&AttendanceInput {
            employee_id: None,
            date: None,
            check_in_time: None,
            check_out_time: None,
        });

        assert_eq!(errors, vec!["Employee ID is required", "Date is required"]);
    }
}
