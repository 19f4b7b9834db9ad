//! Field policy: which signup attributes a viewer sees and may search.

use crate::roles::Role;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Displayable attribute of a signup, including the derived payment delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SignupField {
    OrderNumber,
    NameFirst,
    NameLast,
    DniNumber,
    Email,
    PhoneNumber,
    Country,
    Province,
    City,
    DateArrival,
    DateDeparture,
    Food,
    IsCeliac,
    Disability,
    HelpWith,
    WantsLodging,
    Status,
    LastModifiedAt,
    DaysBetweenPayment,
}

impl SignupField {
    pub const ALL: [SignupField; 19] = [
        SignupField::OrderNumber,
        SignupField::NameFirst,
        SignupField::NameLast,
        SignupField::DniNumber,
        SignupField::Email,
        SignupField::PhoneNumber,
        SignupField::Country,
        SignupField::Province,
        SignupField::City,
        SignupField::DateArrival,
        SignupField::DateDeparture,
        SignupField::Food,
        SignupField::IsCeliac,
        SignupField::Disability,
        SignupField::HelpWith,
        SignupField::WantsLodging,
        SignupField::Status,
        SignupField::LastModifiedAt,
        SignupField::DaysBetweenPayment,
    ];

    /// Attribute name in the stored document; also the header translation key.
    pub fn key(self) -> &'static str {
        match self {
            SignupField::OrderNumber => "orderNumber",
            SignupField::NameFirst => "nameFirst",
            SignupField::NameLast => "nameLast",
            SignupField::DniNumber => "dniNumber",
            SignupField::Email => "email",
            SignupField::PhoneNumber => "phoneNumber",
            SignupField::Country => "country",
            SignupField::Province => "province",
            SignupField::City => "city",
            SignupField::DateArrival => "dateArrival",
            SignupField::DateDeparture => "dateDeparture",
            SignupField::Food => "food",
            SignupField::IsCeliac => "isCeliac",
            SignupField::Disability => "disability",
            SignupField::HelpWith => "helpWith",
            SignupField::WantsLodging => "wantsLodging",
            SignupField::Status => "status",
            SignupField::LastModifiedAt => "lastModifiedAt",
            SignupField::DaysBetweenPayment => "daysBetweenPayment",
        }
    }

    /// Columns that stay visible on narrow viewports.
    pub fn is_essential(self) -> bool {
        matches!(
            self,
            SignupField::NameFirst | SignupField::NameLast | SignupField::Status
        )
    }
}

impl fmt::Display for SignupField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for SignupField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SignupField::ALL
            .iter()
            .copied()
            .find(|f| f.key() == s)
            .ok_or_else(|| format!("unknown signup field '{}'", s))
    }
}

pub const ATTENDANCE_FIELDS: &[SignupField] = &[
    SignupField::NameFirst,
    SignupField::NameLast,
    SignupField::DniNumber,
    SignupField::Food,
    SignupField::IsCeliac,
    SignupField::Disability,
    SignupField::PhoneNumber,
];

pub const PUBLIC_FIELDS: &[SignupField] = &[
    SignupField::OrderNumber,
    SignupField::NameFirst,
    SignupField::NameLast,
    SignupField::Country,
    SignupField::Province,
    SignupField::City,
    SignupField::Status,
    SignupField::LastModifiedAt,
];

pub const PRIVATE_FIELDS: &[SignupField] = &[
    SignupField::DateArrival,
    SignupField::DateDeparture,
    SignupField::Email,
    SignupField::DniNumber,
    SignupField::HelpWith,
    SignupField::Food,
    SignupField::IsCeliac,
    SignupField::PhoneNumber,
    SignupField::Disability,
    SignupField::WantsLodging,
    SignupField::DaysBetweenPayment,
];

/// Globally searchable attributes; narrows the attendance-mode search set.
pub const SEARCHABLE_FIELDS: &[SignupField] = &[
    SignupField::NameFirst,
    SignupField::NameLast,
    SignupField::Country,
    SignupField::Province,
    SignupField::City,
    SignupField::Status,
    SignupField::DniNumber,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ViewMode {
    #[default]
    List,
    Attendance,
}

/// What a column renders: a signup attribute or a per-row action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "field", rename_all = "camelCase")]
pub enum ColumnKind {
    Field(SignupField),
    SentMails,
    BankDetails,
    Receipt,
    Attendance,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub kind: ColumnKind,
    pub header_key: &'static str,
    pub width: u16,
    /// Hidden columns stay in the logical set; only rendering skips them.
    pub hidden: bool,
}

impl Column {
    fn for_field(field: SignupField, small_screen: bool) -> Self {
        let width = if small_screen {
            100
        } else if field == SignupField::Email {
            300
        } else {
            150
        };
        Self {
            kind: ColumnKind::Field(field),
            header_key: field.key(),
            width,
            hidden: small_screen && !field.is_essential(),
        }
    }

    fn action(kind: ColumnKind) -> Self {
        let (header_key, width) = match kind {
            ColumnKind::SentMails => ("mails", 200),
            ColumnKind::BankDetails => ("bank", 200),
            ColumnKind::Receipt => ("receipt", 250),
            ColumnKind::Attendance => ("didAttend", 100),
            ColumnKind::Field(f) => (f.key(), 150),
        };
        Self {
            kind,
            header_key,
            width,
            hidden: false,
        }
    }

    pub fn field(&self) -> Option<SignupField> {
        match self.kind {
            ColumnKind::Field(f) => Some(f),
            _ => None,
        }
    }
}

/// Role plus view mode; everything the field policy depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewerContext {
    pub role: Role,
    pub mode: ViewMode,
}

impl ViewerContext {
    pub fn new(role: Role, mode: ViewMode) -> Self {
        Self { role, mode }
    }

    /// Ordered attribute columns for this viewer.
    pub fn display_fields(&self) -> Vec<SignupField> {
        match self.mode {
            ViewMode::Attendance => ATTENDANCE_FIELDS.to_vec(),
            ViewMode::List if self.role.is_admin() => {
                PUBLIC_FIELDS.iter().chain(PRIVATE_FIELDS).copied().collect()
            }
            ViewMode::List => PUBLIC_FIELDS.to_vec(),
        }
    }

    pub fn searchable_fields(&self) -> Vec<SignupField> {
        match self.mode {
            ViewMode::Attendance => SEARCHABLE_FIELDS
                .iter()
                .copied()
                .filter(|f| ATTENDANCE_FIELDS.contains(f))
                .collect(),
            ViewMode::List => self.display_fields(),
        }
    }

    pub fn can_select_rows(&self) -> bool {
        self.role.is_admin() && self.mode == ViewMode::List
    }

    pub fn can_mark_attendance(&self) -> bool {
        self.role.is_admin() && self.mode == ViewMode::Attendance
    }

    /// Full column layout: attribute columns followed by the action columns
    /// this viewer is entitled to.
    pub fn columns(&self, small_screen: bool) -> Vec<Column> {
        let mut columns: Vec<Column> = self
            .display_fields()
            .into_iter()
            .map(|f| Column::for_field(f, small_screen))
            .collect();

        if self.role == Role::SuperAdmin {
            columns.push(Column::action(ColumnKind::SentMails));
        }
        if self.can_select_rows() {
            columns.push(Column::action(ColumnKind::BankDetails));
            columns.insert(0, Column::action(ColumnKind::Receipt));
        }
        if self.mode == ViewMode::Attendance {
            columns.push(Column::action(ColumnKind::Attendance));
        }
        columns
    }
}
