//! Core data model: identifiers, employees, organizations, and the raw cell
//! grid that ingestion starts from.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of an employee, assigned once at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmployeeId(pub Uuid);

impl EmployeeId {
    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the organization scope an employee belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrganizationId(pub Uuid);

impl OrganizationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for OrganizationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A persisted employee record.
///
/// `manager_id` is a weak reference: it may be absent (a root) or point at an
/// id that no longer exists (an orphan).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    pub title: String,
    pub organization_id: OrganizationId,
    pub manager_id: Option<EmployeeId>,
    #[serde(default)]
    pub custom_fields: BTreeMap<String, String>,
}

/// An employee as read from an uploaded grid, before identifiers exist.
///
/// The manager is referenced by name because the source has no stable keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedEmployee {
    pub name: String,
    pub title: String,
    pub manager_name: Option<String>,
    pub custom_fields: BTreeMap<String, String>,
    /// 1-based row number in the source grid (header is row 1)
    pub row: usize,
}

/// An organization scope and the principals allowed to edit it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: OrganizationId,
    pub name: String,
    pub owner_id: String,
    #[serde(default)]
    pub member_ids: Vec<String>,
}

impl Organization {
    /// Whether the principal owns or is a member of this organization
    pub fn grants_access(&self, principal: &Principal) -> bool {
        self.owner_id == principal.user_id || self.member_ids.contains(&principal.user_id)
    }
}

/// The acting user for an edit
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub user_id: String,
}

impl Principal {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

// ============================================
// Cell grid
// ============================================

/// A single untyped spreadsheet cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Empty,
}

impl CellValue {
    /// Trimmed textual form of the cell; integral numbers drop the fraction
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            CellValue::Bool(b) => b.to_string(),
            CellValue::Empty => String::new(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.as_text().is_empty()
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value.to_string())
        }
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::from(value.as_str())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

/// A 2-D grid of cells; row 0 holds the headers.
///
/// Rows may be ragged; missing trailing cells read as blank.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grid {
    rows: Vec<Vec<CellValue>>,
}

impl Grid {
    pub fn new(rows: Vec<Vec<CellValue>>) -> Self {
        Self { rows }
    }

    /// Build a grid from plain strings (handy for tests and CSV input)
    pub fn from_strings<R, S>(rows: impl IntoIterator<Item = R>) -> Self
    where
        R: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(|s| CellValue::from(s.as_ref())).collect())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows including the header row
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Width of the widest row
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(|r| r.len()).max().unwrap_or(0)
    }

    /// Header texts, padded to the grid width
    pub fn headers(&self) -> Vec<String> {
        let width = self.column_count();
        (0..width).map(|col| self.cell_text(0, col)).collect()
    }

    /// Number of rows after the header
    pub fn data_row_count(&self) -> usize {
        self.rows.len().saturating_sub(1)
    }

    /// Trimmed text of a cell, blank when out of range
    pub fn cell_text(&self, row: usize, col: usize) -> String {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(CellValue::as_text)
            .unwrap_or_default()
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }
}

// ============================================
// Persisted forest view
// ============================================

/// Read-only arena view over a persisted employee set.
///
/// Children keep the order employees appear in the slice. An employee whose
/// manager is absent, dangling, or itself is a root. Employees caught in a
/// manager cycle have a manager but are not reachable from any root; they are
/// reported by [`OrgForest::unreachable`].
#[derive(Debug, Clone)]
pub struct OrgForest<'a> {
    employees: &'a [Employee],
    index: HashMap<EmployeeId, usize>,
    children: HashMap<EmployeeId, Vec<EmployeeId>>,
    roots: Vec<EmployeeId>,
}

impl<'a> OrgForest<'a> {
    pub fn new(employees: &'a [Employee]) -> Self {
        let index: HashMap<EmployeeId, usize> = employees
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id, i))
            .collect();

        let mut children: HashMap<EmployeeId, Vec<EmployeeId>> = HashMap::new();
        let mut roots = Vec::new();
        for employee in employees {
            match employee.manager_id {
                Some(manager) if manager != employee.id && index.contains_key(&manager) => {
                    children.entry(manager).or_default().push(employee.id);
                }
                _ => roots.push(employee.id),
            }
        }

        Self {
            employees,
            index,
            children,
            roots,
        }
    }

    pub fn employees(&self) -> &'a [Employee] {
        self.employees
    }

    pub fn len(&self) -> usize {
        self.employees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.employees.is_empty()
    }

    pub fn get(&self, id: &EmployeeId) -> Option<&'a Employee> {
        self.index.get(id).map(|&i| &self.employees[i])
    }

    pub fn contains(&self, id: &EmployeeId) -> bool {
        self.index.contains_key(id)
    }

    pub fn roots(&self) -> &[EmployeeId] {
        &self.roots
    }

    pub fn children(&self, id: &EmployeeId) -> &[EmployeeId] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_children(&self, id: &EmployeeId) -> bool {
        !self.children(id).is_empty()
    }

    /// Manager of `id`, only when it resolves to a known employee
    pub fn manager_of(&self, id: &EmployeeId) -> Option<EmployeeId> {
        self.get(id)
            .and_then(|e| e.manager_id)
            .filter(|m| self.contains(m))
    }

    /// Chain of managers above `id`, nearest first, stopping at a repeat
    pub fn ancestors(&self, id: &EmployeeId) -> Vec<EmployeeId> {
        let mut chain = Vec::new();
        let mut seen = HashSet::from([*id]);
        let mut current = self.manager_of(id);
        while let Some(manager) = current {
            if !seen.insert(manager) {
                break;
            }
            chain.push(manager);
            current = self.manager_of(&manager);
        }
        chain
    }

    /// All employees below `id`, pre-order
    pub fn descendants(&self, id: &EmployeeId) -> Vec<EmployeeId> {
        let mut out = Vec::new();
        let mut seen = HashSet::from([*id]);
        let mut stack: Vec<EmployeeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            if !seen.insert(next) {
                continue;
            }
            out.push(next);
            stack.extend(self.children(&next).iter().rev().copied());
        }
        out
    }

    /// Employees that cannot be reached by walking down from any root
    pub fn unreachable(&self) -> Vec<EmployeeId> {
        let mut reached: HashSet<EmployeeId> = HashSet::new();
        for root in &self.roots {
            reached.insert(*root);
            reached.extend(self.descendants(root));
        }
        self.employees
            .iter()
            .map(|e| e.id)
            .filter(|id| !reached.contains(id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee(name: &str, org: OrganizationId, manager: Option<EmployeeId>) -> Employee {
        Employee {
            id: EmployeeId::generate(),
            name: name.to_string(),
            title: String::new(),
            organization_id: org,
            manager_id: manager,
            custom_fields: BTreeMap::new(),
        }
    }

    #[test]
    fn test_cell_text_formats_numbers() {
        assert_eq!(CellValue::Number(42.0).as_text(), "42");
        assert_eq!(CellValue::Number(1.5).as_text(), "1.5");
        assert_eq!(CellValue::Text("  Ada ".into()).as_text(), "Ada");
        assert!(CellValue::Empty.is_blank());
    }

    #[test]
    fn test_grid_ragged_rows() {
        let grid = Grid::from_strings(vec![vec!["Name", "Manager"], vec!["Ada"]]);
        assert_eq!(grid.column_count(), 2);
        assert_eq!(grid.cell_text(1, 1), "");
        assert_eq!(grid.cell_text(5, 0), "");
        assert_eq!(grid.headers(), vec!["Name", "Manager"]);
        assert_eq!(grid.data_row_count(), 1);
    }

    #[test]
    fn test_grid_deserializes_mixed_json() {
        let grid: Grid = serde_json::from_str(r#"[["Name","Id"],["Ada",7],["Bob",null]]"#)
            .expect("valid grid");
        assert_eq!(grid.cell_text(1, 1), "7");
        assert_eq!(grid.cell_text(2, 1), "");
    }

    #[test]
    fn test_forest_roots_children_and_orphans() {
        let org = OrganizationId::generate();
        let ceo = employee("CEO", org, None);
        let vp = employee("VP", org, Some(ceo.id));
        let orphan = employee("Lost", org, Some(EmployeeId::generate()));
        let employees = vec![ceo.clone(), vp.clone(), orphan.clone()];
        let forest = OrgForest::new(&employees);

        assert_eq!(forest.roots(), &[ceo.id, orphan.id]);
        assert_eq!(forest.children(&ceo.id), &[vp.id]);
        assert_eq!(forest.ancestors(&vp.id), vec![ceo.id]);
        assert_eq!(forest.descendants(&ceo.id), vec![vp.id]);
        assert!(forest.unreachable().is_empty());
    }

    #[test]
    fn test_forest_cycle_is_unreachable() {
        let org = OrganizationId::generate();
        let mut a = employee("A", org, None);
        let b = employee("B", org, Some(a.id));
        a.manager_id = Some(b.id);
        let employees = vec![a.clone(), b.clone()];
        let forest = OrgForest::new(&employees);

        assert!(forest.roots().is_empty());
        assert_eq!(forest.unreachable(), vec![a.id, b.id]);
        assert_eq!(forest.ancestors(&a.id), vec![b.id]);
    }
}
