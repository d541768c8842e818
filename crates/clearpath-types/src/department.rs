//! The department catalog.
//!
//! Two kinds of department matter for clearance: the fixed service
//! departments every student must clear (the catalog below), and the
//! student's own academic department, which is appended per student at
//! aggregation time.

use serde::{Deserialize, Serialize};

/// A row from the `departments` table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Department {
    pub name: String,
    pub code: String,
}

/// A fixed catalog entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CatalogDepartment {
    pub name: &'static str,
    pub code: &'static str,
}

/// The service departments every student clears, in display order.
pub const CATALOG: &[CatalogDepartment] = &[
    CatalogDepartment { name: "Library", code: "LIB" },
    CatalogDepartment { name: "Computer Science", code: "CS" },
    CatalogDepartment { name: "Engineering", code: "ENG" },
    CatalogDepartment { name: "Business", code: "BUS" },
    CatalogDepartment { name: "Science", code: "SCI" },
    CatalogDepartment { name: "SS&FC", code: "SSFC" },
    CatalogDepartment { name: "Mess", code: "MESS" },
    CatalogDepartment { name: "AV Unit", code: "AV" },
    CatalogDepartment { name: "Bookshop", code: "BOOK" },
    CatalogDepartment { name: "Accounts Office", code: "ACC" },
];

/// Synthetic code for a student's home department: the first three
/// characters of its name, uppercased.
pub fn home_department_code(name: &str) -> String {
    name.chars().take(3).collect::<String>().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_order_and_size() {
        assert_eq!(CATALOG.len(), 10);
        assert_eq!(CATALOG[0].name, "Library");
        assert_eq!(CATALOG[9].code, "ACC");
    }

    #[test]
    fn test_home_department_code() {
        assert_eq!(home_department_code("Architecture"), "ARC");
        assert_eq!(home_department_code("IT"), "IT");
    }
}
