//! Canonical column vocabulary.
//!
//! Every recognized ledger is mapped onto these names. The sixteen
//! descriptive columns form the group key, the four amount columns are
//! summed, and the ordering columns only drive the row sort before
//! forward-fill. Declaration order is output order.

use std::fmt;

use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CanonicalColumn {
    DebitAccountCode,
    DebitAccountName,
    DebitSubAccountCode,
    DebitSubAccountName,
    DebitTaxCategory,
    DebitDepartmentCode,
    DebitDepartmentName,
    DebitReserved,
    CreditAccountCode,
    CreditAccountName,
    CreditSubAccountCode,
    CreditSubAccountName,
    CreditTaxCategory,
    CreditDepartmentCode,
    CreditDepartmentName,
    CreditReserved,
    DebitAmount,
    CreditAmount,
    DebitTaxAmount,
    CreditTaxAmount,
    Year,
    Month,
    Day,
    VoucherNo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Descriptive,
    Amount,
    Ordering,
}

use CanonicalColumn::*;

pub const ALL_COLUMNS: [CanonicalColumn; 24] = [
    DebitAccountCode,
    DebitAccountName,
    DebitSubAccountCode,
    DebitSubAccountName,
    DebitTaxCategory,
    DebitDepartmentCode,
    DebitDepartmentName,
    DebitReserved,
    CreditAccountCode,
    CreditAccountName,
    CreditSubAccountCode,
    CreditSubAccountName,
    CreditTaxCategory,
    CreditDepartmentCode,
    CreditDepartmentName,
    CreditReserved,
    DebitAmount,
    CreditAmount,
    DebitTaxAmount,
    CreditTaxAmount,
    Year,
    Month,
    Day,
    VoucherNo,
];

pub const AMOUNT_COLUMNS: [CanonicalColumn; 4] =
    [DebitAmount, CreditAmount, DebitTaxAmount, CreditTaxAmount];

/// Sort priority: year, month, day, voucher number.
pub const ORDERING_COLUMNS: [CanonicalColumn; 4] = [Year, Month, Day, VoucherNo];

/// Credit-side hierarchy, forward-filled after sorting.
pub const CREDIT_HIERARCHY_COLUMNS: [CanonicalColumn; 4] = [
    CreditAccountCode,
    CreditAccountName,
    CreditSubAccountCode,
    CreditSubAccountName,
];

/// Credit-side codes where a literal `0` means "no value".
pub const ZERO_SENTINEL_COLUMNS: [CanonicalColumn; 2] = [CreditAccountCode, CreditSubAccountCode];

impl CanonicalColumn {
    pub fn name(self) -> &'static str {
        match self {
            DebitAccountCode => "要素内訳借方勘定科目コード",
            DebitAccountName => "要素内訳借方勘定科目名称",
            DebitSubAccountCode => "要素内訳借方補助科目コード",
            DebitSubAccountName => "要素内訳借方補助科目名称",
            DebitTaxCategory => "要素内訳借方税区分",
            DebitDepartmentCode => "要素内訳借方部門コード",
            DebitDepartmentName => "要素内訳借方部門名称",
            DebitReserved => "要素内訳借方予備",
            CreditAccountCode => "要素内訳貸方勘定科目コード",
            CreditAccountName => "要素内訳貸方勘定科目名称",
            CreditSubAccountCode => "要素内訳貸方補助科目コード",
            CreditSubAccountName => "要素内訳貸方補助科目名称",
            CreditTaxCategory => "要素内訳貸方税区分",
            CreditDepartmentCode => "要素内訳貸方部門コード",
            CreditDepartmentName => "要素内訳貸方部門名称",
            CreditReserved => "要素内訳貸方予備",
            DebitAmount => "借方金額",
            CreditAmount => "貸方金額",
            DebitTaxAmount => "借方消費税金額",
            CreditTaxAmount => "貸方消費税金額",
            Year => "年",
            Month => "月",
            Day => "日",
            VoucherNo => "伝票No",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        ALL_COLUMNS.iter().copied().find(|c| c.name() == name)
    }

    pub fn kind(self) -> ColumnKind {
        match self {
            DebitAmount | CreditAmount | DebitTaxAmount | CreditTaxAmount => ColumnKind::Amount,
            Year | Month | Day | VoucherNo => ColumnKind::Ordering,
            _ => ColumnKind::Descriptive,
        }
    }

    pub fn is_descriptive(self) -> bool {
        self.kind() == ColumnKind::Descriptive
    }

    pub fn is_amount(self) -> bool {
        self.kind() == ColumnKind::Amount
    }

    pub fn is_output(self) -> bool {
        self.kind() != ColumnKind::Ordering
    }
}

impl fmt::Display for CanonicalColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for CanonicalColumn {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Descriptive columns in output order.
pub fn descriptive_columns() -> impl Iterator<Item = CanonicalColumn> {
    ALL_COLUMNS.into_iter().filter(|c| c.is_descriptive())
}
