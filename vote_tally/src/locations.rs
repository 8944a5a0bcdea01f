//! Reference table of locations: department, then province, then district.
//!
//! The table is read once and never modified. It drives the cascading
//! selection of the voting form, where choosing a department restricts the
//! provinces on offer, and choosing a province restricts the districts.

use log::debug;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::config::TallyErrors;

const BUILTIN_TABLE: &str = include_str!("../data/locations.json");

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Province {
    pub name: String,
    pub districts: Vec<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Department {
    pub name: String,
    pub provinces: Vec<Province>,
}

/// The location hierarchy, in the order it was loaded.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct LocationTable {
    departments: Vec<Department>,
}

impl LocationTable {
    /// The table shipped with the library (departments of Peru, with a
    /// selection of provinces and districts).
    pub fn builtin() -> Result<LocationTable, TallyErrors> {
        LocationTable::from_json(BUILTIN_TABLE)
    }

    /// Reads a table from its JSON form:
    /// `{"departments": [{"name": .., "provinces": [{"name": .., "districts": [..]}]}]}`
    pub fn from_json(js: &str) -> Result<LocationTable, TallyErrors> {
        let table: LocationTable = serde_json::from_str(js)
            .map_err(|e| TallyErrors::InvalidLocationTable(e.to_string()))?;
        LocationTable::new(table.departments)
    }

    pub fn new(departments: Vec<Department>) -> Result<LocationTable, TallyErrors> {
        if departments.is_empty() {
            return Err(TallyErrors::InvalidLocationTable(
                "no departments".to_string(),
            ));
        }
        let mut seen: HashSet<&str> = HashSet::new();
        for d in departments.iter() {
            if !seen.insert(d.name.as_str()) {
                return Err(TallyErrors::InvalidLocationTable(format!(
                    "duplicate department {:?}",
                    d.name
                )));
            }
        }
        debug!("LocationTable: loaded {} departments", departments.len());
        Ok(LocationTable { departments })
    }

    pub fn list_departments(&self) -> Vec<&str> {
        self.departments.iter().map(|d| d.name.as_str()).collect()
    }

    /// The provinces of a department. Empty if the department is unknown or
    /// not chosen yet.
    pub fn list_provinces(&self, department: Option<&str>) -> Vec<&str> {
        match self.department(department) {
            Some(d) => d.provinces.iter().map(|p| p.name.as_str()).collect(),
            None => vec![],
        }
    }

    /// The districts of a province. Empty if either key is unknown or not
    /// chosen yet.
    pub fn list_districts(&self, department: Option<&str>, province: Option<&str>) -> Vec<&str> {
        match self.province(department, province) {
            Some(p) => p.districts.iter().map(|s| s.as_str()).collect(),
            None => vec![],
        }
    }

    /// Checks that the chain of names exists in the table.
    pub fn contains(&self, department: &str, province: &str, district: &str) -> bool {
        self.list_districts(Some(department), Some(province))
            .contains(&district)
    }

    fn department(&self, name: Option<&str>) -> Option<&Department> {
        let name = name.filter(|s| !s.is_empty())?;
        self.departments.iter().find(|d| d.name == name)
    }

    fn province(&self, department: Option<&str>, name: Option<&str>) -> Option<&Province> {
        let name = name.filter(|s| !s.is_empty())?;
        self.department(department)?
            .provinces
            .iter()
            .find(|p| p.name == name)
    }
}

/// The state of a cascading selection.
///
/// Changing a level clears all the levels below it, so a selection never
/// holds a district from another province.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationSelection {
    department: Option<String>,
    province: Option<String>,
    district: Option<String>,
}

impl LocationSelection {
    pub fn new() -> LocationSelection {
        LocationSelection::default()
    }

    pub fn department(&self) -> Option<&str> {
        self.department.as_deref()
    }

    pub fn province(&self) -> Option<&str> {
        self.province.as_deref()
    }

    pub fn district(&self) -> Option<&str> {
        self.district.as_deref()
    }

    pub fn select_department(&mut self, department: &str) {
        self.department = Some(department.to_string());
        self.province = None;
        self.district = None;
    }

    pub fn select_province(&mut self, province: &str) {
        self.province = Some(province.to_string());
        self.district = None;
    }

    pub fn select_district(&mut self, district: &str) {
        self.district = Some(district.to_string());
    }

    /// The provinces to offer for the current department.
    pub fn province_choices<'a>(&self, table: &'a LocationTable) -> Vec<&'a str> {
        table.list_provinces(self.department())
    }

    /// The districts to offer for the current province.
    pub fn district_choices<'a>(&self, table: &'a LocationTable) -> Vec<&'a str> {
        table.list_districts(self.department(), self.province())
    }

    /// True when all three levels are chosen and exist in the table.
    pub fn is_complete(&self, table: &LocationTable) -> bool {
        match (self.department(), self.province(), self.district()) {
            (Some(d), Some(p), Some(x)) => table.contains(d, p, x),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> LocationTable {
        LocationTable::builtin().unwrap()
    }

    #[test]
    fn builtin_departments_in_order() {
        let t = table();
        let deps = t.list_departments();
        assert_eq!(deps.first(), Some(&"Amazonas"));
        assert!(deps.contains(&"Lima"));
        assert_eq!(deps.len(), 7);
    }

    #[test]
    fn unknown_or_unset_keys_give_nothing() {
        let t = table();
        assert!(t.list_provinces(Some("Unknown Department")).is_empty());
        assert!(t.list_provinces(None).is_empty());
        assert!(t.list_provinces(Some("")).is_empty());
        assert!(t.list_districts(Some("Lima"), None).is_empty());
        assert!(t.list_districts(Some("Lima"), Some("Cusco")).is_empty());
        assert!(t.list_districts(None, Some("Lima")).is_empty());
    }

    #[test]
    fn cascade() {
        let t = table();
        assert_eq!(
            t.list_provinces(Some("Lima")),
            vec!["Lima", "Huaral", "Cañete"]
        );
        let districts = t.list_districts(Some("Cusco"), Some("Urubamba"));
        assert_eq!(districts[0], "Urubamba");
        assert!(districts.contains(&"Ollantaytambo"));
        assert!(t.contains("Lima", "Lima", "Miraflores"));
        assert!(!t.contains("Cusco", "Lima", "Miraflores"));
    }

    #[test]
    fn selection_resets_lower_levels() {
        let t = table();
        let mut s = LocationSelection::new();
        s.select_department("Lima");
        s.select_province("Lima");
        s.select_district("Barranco");
        assert!(s.is_complete(&t));

        s.select_department("Cusco");
        assert_eq!(s.province(), None);
        assert_eq!(s.district(), None);
        assert!(!s.is_complete(&t));
        assert!(s.district_choices(&t).is_empty());
        assert_eq!(s.province_choices(&t)[0], "Cusco");

        s.select_province("Urubamba");
        s.select_district("Chinchero");
        s.select_province("Cusco");
        assert_eq!(s.district(), None);
        assert_eq!(s.department(), Some("Cusco"));
    }

    #[test]
    fn bad_tables() {
        assert!(matches!(
            LocationTable::from_json("{"),
            Err(TallyErrors::InvalidLocationTable(_))
        ));
        assert!(matches!(
            LocationTable::from_json(r#"{"departments": []}"#),
            Err(TallyErrors::InvalidLocationTable(_))
        ));
        let dup = r#"{"departments": [
            {"name": "Lima", "provinces": []},
            {"name": "Lima", "provinces": []}
        ]}"#;
        assert!(LocationTable::from_json(dup).is_err());
    }
}
