//! Statement ledger: ordering, running balances, summary and entry builder.

use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDate;
use mockable::Clock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::records::{Service, SetupFee, Statement, StatementDraft};

/// Message shown when a line predates its service.
pub const BEFORE_START_MESSAGE: &str =
    "Statement date cannot be earlier than the service start date.";

/// Order lines by date ascending; undated lines first, ties keep API order.
pub fn sort_by_date(statements: &mut [Statement]) {
    statements.sort_by(|a, b| compare_dates(a.date, b.date));
}

fn compare_dates(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => x.cmp(&y),
    }
}

/// Line with the balance after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerRow {
    /// Statement line.
    #[serde(flatten)]
    pub statement: Statement,
    /// Cumulative `credit - debit` up to and including this line.
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
}

/// Running balances over `statements` in the given order.
///
/// # Examples
/// ```
/// use care_console::domain::ledger::running_balances;
/// use care_console::domain::records::{ApiRecord, Statement};
/// use rust_decimal::Decimal;
/// use serde_json::json;
///
/// let rows = [
///     Statement::from_value(&json!({ "credit": 100, "debit": 0 })),
///     Statement::from_value(&json!({ "credit": 0, "debit": 30 })),
/// ];
/// let balances: Vec<Decimal> = running_balances(&rows).into_iter().map(|r| r.balance).collect();
/// assert_eq!(balances, vec![Decimal::from(100), Decimal::from(70)]);
/// ```
#[must_use]
pub fn running_balances(statements: &[Statement]) -> Vec<LedgerRow> {
    statements
        .iter()
        .scan(Decimal::ZERO, |running, statement| {
            *running += statement.credit - statement.debit;
            Some(LedgerRow {
                statement: statement.clone(),
                balance: *running,
            })
        })
        .collect()
}

/// Sign of the ledger balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Standing {
    /// Balance below zero.
    Overdrawn,
    /// Balance zero or above.
    Credit,
}

impl fmt::Display for Standing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Overdrawn => "Overdrawn",
            Self::Credit => "Credit",
        })
    }
}

/// Totals shown above the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LedgerSummary {
    /// Sum of debits.
    #[serde(with = "rust_decimal::serde::float")]
    pub total_debit: Decimal,
    /// Sum of credits.
    #[serde(with = "rust_decimal::serde::float")]
    pub total_credit: Decimal,
    /// `total_credit - total_debit`.
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    /// Label for the balance.
    pub standing: Standing,
}

impl LedgerSummary {
    /// Summarise `statements`.
    #[must_use]
    pub fn of(statements: &[Statement]) -> Self {
        let (total_debit, total_credit) = statements
            .iter()
            .fold((Decimal::ZERO, Decimal::ZERO), |(debit, credit), s| {
                (debit + s.debit, credit + s.credit)
            });
        let balance = total_credit - total_debit;
        Self {
            total_debit,
            total_credit,
            balance,
            standing: if balance < Decimal::ZERO {
                Standing::Overdrawn
            } else {
                Standing::Credit
            },
        }
    }

    /// Magnitude shown next to the standing label.
    #[must_use]
    pub fn amount(&self) -> Decimal {
        self.balance.abs()
    }
}

/// Rows with running balances plus their summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ledger {
    /// Lines in display order.
    pub rows: Vec<LedgerRow>,
    /// Totals over the same lines.
    pub summary: LedgerSummary,
}

impl Ledger {
    /// Ledger over `statements`, which must already be in display order.
    #[must_use]
    pub fn of(statements: &[Statement]) -> Self {
        Self {
            rows: running_balances(statements),
            summary: LedgerSummary::of(statements),
        }
    }
}

/// Kind of statement line the entry builder can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StatementKind {
    /// Monthly management fee.
    MonthlyFee,
    /// Pension setup fee.
    PensionFee,
    /// Annual pension fee.
    AnnualPensionFee,
    /// Annual year-end fee.
    AnnualYearEndFee,
    /// Agency invoice.
    Agency,
    /// Self-employed PA invoice.
    SelfPa,
    /// Carer salary.
    Carer,
    /// Remittance received from the council.
    NwaRemittance,
    /// Insurance invoice.
    Insurance,
    /// Free-form line.
    Other,
}

impl StatementKind {
    /// Every kind, in menu order.
    pub const ALL: [Self; 10] = [
        Self::MonthlyFee,
        Self::PensionFee,
        Self::AnnualPensionFee,
        Self::AnnualYearEndFee,
        Self::Agency,
        Self::SelfPa,
        Self::Carer,
        Self::NwaRemittance,
        Self::Insurance,
        Self::Other,
    ];

    /// Kinds a service with `setup_fee` accepts.
    #[must_use]
    pub fn allowed_for(setup_fee: &SetupFee) -> &'static [Self] {
        const MANAGED: &[StatementKind] = &[
            StatementKind::MonthlyFee,
            StatementKind::Agency,
            StatementKind::SelfPa,
            StatementKind::NwaRemittance,
            StatementKind::Insurance,
            StatementKind::Other,
        ];
        const PAYROLL: &[StatementKind] = &[
            StatementKind::MonthlyFee,
            StatementKind::PensionFee,
            StatementKind::AnnualPensionFee,
            StatementKind::AnnualYearEndFee,
            StatementKind::SelfPa,
            StatementKind::Carer,
            StatementKind::NwaRemittance,
            StatementKind::Insurance,
            StatementKind::Other,
        ];
        const FALLBACK: &[StatementKind] = &[StatementKind::NwaRemittance, StatementKind::Other];

        match setup_fee {
            SetupFee::ManagedAccount => MANAGED,
            SetupFee::Payroll => PAYROLL,
            SetupFee::ManagedAccountAndPayroll => &Self::ALL,
            SetupFee::Unspecified | SetupFee::Other(_) => FALLBACK,
        }
    }

    /// Menu label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::MonthlyFee => "Monthly Fee",
            Self::PensionFee => "Pension Fee",
            Self::AnnualPensionFee => "Annual Pension Fee",
            Self::AnnualYearEndFee => "Annual Year-End Fee",
            Self::Agency => "Agency",
            Self::SelfPa => "Self-Employed PA",
            Self::Carer => "Carer",
            Self::NwaRemittance => "NWA Remittance",
            Self::Insurance => "Insurance",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Invoice reference with its service period.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Invoice {
    /// Payee (agency, PA or insurer).
    pub payee: String,
    /// Invoice number.
    pub number: String,
    /// Period start.
    #[serde(default)]
    pub from: Option<NaiveDate>,
    /// Period end.
    #[serde(default)]
    pub to: Option<NaiveDate>,
}

/// Typed input for one new statement line.
///
/// Read from JSON tagged by `kind`, e.g.
/// `{"kind": "monthly_fee", "month": "2024-01-01", "amount": "120.00"}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StatementEntry {
    /// Debit `Monthly Fee - Mon YY`.
    MonthlyFee {
        /// Any day in the billed month.
        month: NaiveDate,
        /// Fee.
        amount: Decimal,
    },
    /// Debit `Pension Setup`.
    PensionFee {
        /// Fee.
        amount: Decimal,
    },
    /// Debit `Annual Pension Fee {start}-{end}`.
    AnnualPensionFee {
        /// First year of the period.
        start_year: i32,
        /// Last year of the period.
        end_year: i32,
        /// Fee.
        amount: Decimal,
    },
    /// Debit `Annual Year End Fee {start}-{end}`.
    AnnualYearEndFee {
        /// First year of the period.
        start_year: i32,
        /// Last year of the period.
        end_year: i32,
        /// Fee.
        amount: Decimal,
    },
    /// Debit `{agency} - Inv {n} - {from} - {to}`.
    Agency {
        /// Invoice details.
        invoice: Invoice,
        /// Amount.
        amount: Decimal,
    },
    /// Debit `{pa} - Inv {n} - {from} - {to}`.
    SelfPa {
        /// Invoice details.
        invoice: Invoice,
        /// Amount.
        amount: Decimal,
    },
    /// Debit `PA - {carer} - Mon YY Salary`.
    Carer {
        /// Carer name.
        carer: String,
        /// Any day in the salary month.
        month: NaiveDate,
        /// Salary.
        amount: Decimal,
    },
    /// Credit `NWA Remittance From dd-Mon-yy to dd-Mon-yy`.
    NwaRemittance {
        /// Period start.
        from: Option<NaiveDate>,
        /// Period end.
        to: Option<NaiveDate>,
        /// Amount received.
        amount: Decimal,
    },
    /// Debit `{insurer} - Inv {n} - {start} - {end}` with ISO dates.
    Insurance {
        /// Invoice details.
        invoice: Invoice,
        /// Premium.
        amount: Decimal,
    },
    /// Free-form line; blank descriptions become `Other Transaction`.
    Other {
        /// Description.
        description: String,
        /// Amount paid in.
        credit: Decimal,
        /// Amount paid out.
        debit: Decimal,
    },
}

fn short_date(day: Option<NaiveDate>) -> String {
    day.map(|d| d.format("%d-%b-%y").to_string())
        .unwrap_or_default()
}

fn iso_date(day: Option<NaiveDate>) -> String {
    day.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn month_year(day: NaiveDate) -> String {
    day.format("%b %y").to_string()
}

impl StatementEntry {
    /// Kind of this entry.
    #[must_use]
    pub const fn kind(&self) -> StatementKind {
        match self {
            Self::MonthlyFee { .. } => StatementKind::MonthlyFee,
            Self::PensionFee { .. } => StatementKind::PensionFee,
            Self::AnnualPensionFee { .. } => StatementKind::AnnualPensionFee,
            Self::AnnualYearEndFee { .. } => StatementKind::AnnualYearEndFee,
            Self::Agency { .. } => StatementKind::Agency,
            Self::SelfPa { .. } => StatementKind::SelfPa,
            Self::Carer { .. } => StatementKind::Carer,
            Self::NwaRemittance { .. } => StatementKind::NwaRemittance,
            Self::Insurance { .. } => StatementKind::Insurance,
            Self::Other { .. } => StatementKind::Other,
        }
    }

    /// Line description.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::MonthlyFee { month, .. } => format!("Monthly Fee - {}", month_year(*month)),
            Self::PensionFee { .. } => "Pension Setup".to_owned(),
            Self::AnnualPensionFee {
                start_year,
                end_year,
                ..
            } => format!("Annual Pension Fee {start_year}-{end_year}"),
            Self::AnnualYearEndFee {
                start_year,
                end_year,
                ..
            } => format!("Annual Year End Fee {start_year}-{end_year}"),
            Self::Agency { invoice, .. } | Self::SelfPa { invoice, .. } => format!(
                "{} - Inv {} - {} - {}",
                invoice.payee,
                invoice.number,
                short_date(invoice.from),
                short_date(invoice.to)
            ),
            Self::Carer { carer, month, .. } => {
                format!("PA - {carer} - {} Salary", month_year(*month))
            }
            Self::NwaRemittance { from, to, .. } => format!(
                "NWA Remittance From {} to {}",
                short_date(*from),
                short_date(*to)
            ),
            Self::Insurance { invoice, .. } => format!(
                "{} - Inv {} - {} - {}",
                invoice.payee,
                invoice.number,
                iso_date(invoice.from),
                iso_date(invoice.to)
            ),
            Self::Other { description, .. } => {
                let trimmed = description.trim();
                if trimmed.is_empty() {
                    "Other Transaction".to_owned()
                } else {
                    trimmed.to_owned()
                }
            }
        }
    }

    /// `(credit, debit)` amounts.
    #[must_use]
    pub const fn amounts(&self) -> (Decimal, Decimal) {
        match self {
            Self::NwaRemittance { amount, .. } => (*amount, Decimal::ZERO),
            Self::Other { credit, debit, .. } => (*credit, *debit),
            Self::MonthlyFee { amount, .. }
            | Self::PensionFee { amount }
            | Self::AnnualPensionFee { amount, .. }
            | Self::AnnualYearEndFee { amount, .. }
            | Self::Agency { amount, .. }
            | Self::SelfPa { amount, .. }
            | Self::Carer { amount, .. }
            | Self::Insurance { amount, .. } => (Decimal::ZERO, *amount),
        }
    }
}

/// Ledger rule violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// The line predates the service start.
    #[error("{BEFORE_START_MESSAGE}")]
    BeforeServiceStart {
        /// Requested date.
        date: NaiveDate,
        /// Service start.
        start: NaiveDate,
    },
    /// The service's setup fee does not accept this kind.
    #[error("{kind} statements are not available for setup fee `{setup_fee}`.")]
    KindNotAllowed {
        /// Requested kind.
        kind: StatementKind,
        /// Service setup fee label.
        setup_fee: String,
    },
}

/// Reject dates before the service start; services without a start date
/// accept any date.
///
/// # Errors
///
/// Returns [`LedgerError::BeforeServiceStart`].
pub fn check_start_date(service: &Service, date: NaiveDate) -> Result<(), LedgerError> {
    match service.start_date {
        Some(start) if date < start => Err(LedgerError::BeforeServiceStart { date, start }),
        _ => Ok(()),
    }
}

/// Builds statement drafts for one service.
pub struct EntryBuilder<'a> {
    service: &'a Service,
    clock: &'a dyn Clock,
}

impl<'a> EntryBuilder<'a> {
    /// Builder for `service`; `clock` supplies "today" for undated entries.
    #[must_use]
    pub fn new(service: &'a Service, clock: &'a dyn Clock) -> Self {
        Self { service, clock }
    }

    /// Kinds the service accepts.
    #[must_use]
    pub fn allowed_kinds(&self) -> &'static [StatementKind] {
        StatementKind::allowed_for(&self.service.setup_fee)
    }

    /// Turn `entry` into a draft dated `date` (today when absent).
    ///
    /// # Errors
    ///
    /// Fails when the kind is not allowed for the service or the date
    /// predates the service start.
    pub fn build(
        &self,
        entry: &StatementEntry,
        date: Option<NaiveDate>,
        entered_by: &str,
    ) -> Result<StatementDraft, LedgerError> {
        let kind = entry.kind();
        if !self.allowed_kinds().contains(&kind) {
            return Err(LedgerError::KindNotAllowed {
                kind,
                setup_fee: self.service.setup_fee.to_string(),
            });
        }
        let date = date.unwrap_or_else(|| self.clock.utc().date_naive());
        check_start_date(self.service, date)?;

        let (credit, debit) = entry.amounts();
        Ok(StatementDraft {
            date,
            description: entry.description(),
            credit,
            debit,
            entered_by: entered_by.to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::records::ApiRecord;
    use chrono::{DateTime, Local, TimeZone, Utc};
    use rstest::{fixture, rstest};
    use serde_json::json;

    struct FixtureClock(DateTime<Utc>);

    impl Clock for FixtureClock {
        fn local(&self) -> DateTime<Local> {
            self.0.with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            self.0
        }
    }

    #[fixture]
    fn clock() -> FixtureClock {
        FixtureClock(
            Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0)
                .single()
                .expect("fixture time"),
        )
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("date")
    }

    fn money(units: i64) -> Decimal {
        Decimal::new(units, 2)
    }

    fn service(setup_fee: SetupFee) -> Service {
        Service {
            id: "SV-1".to_owned(),
            setup_fee,
            start_date: Some(day(2024, 1, 1)),
            ..Service::default()
        }
    }

    #[rstest]
    fn undated_lines_sort_first_and_ties_keep_order() {
        let mut rows = vec![
            Statement::from_value(&json!({ "id": "b", "date": "2024-02-01" })),
            Statement::from_value(&json!({ "id": "x" })),
            Statement::from_value(&json!({ "id": "a", "date": "2024-01-01" })),
            Statement::from_value(&json!({ "id": "c", "date": "2024-02-01" })),
        ];
        sort_by_date(&mut rows);
        let ids: Vec<&str> = rows.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["x", "a", "b", "c"]);
    }

    #[rstest]
    #[case::overdrawn(json!([{ "credit": 10, "debit": 25.5 }]), "-15.50", Standing::Overdrawn)]
    #[case::credit(json!([{ "credit": "40" }, { "debit": 15 }]), "25", Standing::Credit)]
    #[case::zero(json!([]), "0", Standing::Credit)]
    fn summary_labels_the_balance(
        #[case] payload: serde_json::Value,
        #[case] balance: &str,
        #[case] standing: Standing,
    ) {
        let rows = Statement::list_from_value(&payload, None);
        let summary = LedgerSummary::of(&rows);
        let expected: Decimal = balance.parse().expect("decimal");
        assert_eq!(summary.balance, expected);
        assert_eq!(summary.amount(), expected.abs());
        assert_eq!(summary.standing, standing);
    }

    #[rstest]
    #[case(SetupFee::ManagedAccount, 6, false)]
    #[case(SetupFee::Payroll, 9, true)]
    #[case(SetupFee::ManagedAccountAndPayroll, 10, true)]
    #[case(SetupFee::Other("Legacy".to_owned()), 2, false)]
    fn kinds_follow_the_setup_fee(
        #[case] fee: SetupFee,
        #[case] count: usize,
        #[case] has_carer: bool,
    ) {
        let kinds = StatementKind::allowed_for(&fee);
        assert_eq!(kinds.len(), count);
        assert_eq!(kinds.contains(&StatementKind::Carer), has_carer);
        assert!(kinds.contains(&StatementKind::Other));
    }

    #[rstest]
    #[case::monthly(
        StatementEntry::MonthlyFee { month: day(2024, 1, 9), amount: money(3500) },
        "Monthly Fee - Jan 24", money(0), money(3500)
    )]
    #[case::remittance(
        StatementEntry::NwaRemittance {
            from: Some(day(2024, 1, 1)),
            to: Some(day(2024, 1, 31)),
            amount: money(120_000),
        },
        "NWA Remittance From 01-Jan-24 to 31-Jan-24", money(120_000), money(0)
    )]
    #[case::self_pa(
        StatementEntry::SelfPa {
            invoice: Invoice {
                payee: "Jo Bloggs".to_owned(),
                number: "17".to_owned(),
                from: Some(day(2024, 3, 1)),
                to: None,
            },
            amount: money(5000),
        },
        "Jo Bloggs - Inv 17 - 01-Mar-24 - ", money(0), money(5000)
    )]
    #[case::insurance(
        StatementEntry::Insurance {
            invoice: Invoice {
                payee: "Acme".to_owned(),
                number: "9".to_owned(),
                from: Some(day(2024, 4, 1)),
                to: Some(day(2025, 3, 31)),
            },
            amount: money(9900),
        },
        "Acme - Inv 9 - 2024-04-01 - 2025-03-31", money(0), money(9900)
    )]
    #[case::other_blank(
        StatementEntry::Other { description: " ".to_owned(), credit: money(100), debit: money(50) },
        "Other Transaction", money(100), money(50)
    )]
    fn descriptions_and_amounts(
        #[case] entry: StatementEntry,
        #[case] description: &str,
        #[case] credit: Decimal,
        #[case] debit: Decimal,
    ) {
        assert_eq!(entry.description(), description);
        assert_eq!(entry.amounts(), (credit, debit));
    }

    #[rstest]
    fn carer_and_annual_descriptions() {
        let carer = StatementEntry::Carer {
            carer: "Sam".to_owned(),
            month: day(2024, 2, 1),
            amount: money(1),
        };
        assert_eq!(carer.description(), "PA - Sam - Feb 24 Salary");
        let annual = StatementEntry::AnnualYearEndFee {
            start_year: 2023,
            end_year: 2024,
            amount: money(1),
        };
        assert_eq!(annual.description(), "Annual Year End Fee 2023-2024");
    }

    #[rstest]
    fn builder_defaults_the_date_to_today(clock: FixtureClock) {
        let service = service(SetupFee::Payroll);
        let builder = EntryBuilder::new(&service, &clock);
        let draft = builder
            .build(&StatementEntry::PensionFee { amount: money(2500) }, None, "Amy")
            .expect("draft");
        assert_eq!(draft.date, day(2024, 6, 15));
        assert_eq!(draft.description, "Pension Setup");
        assert_eq!(draft.entered_by, "Amy");
    }

    #[rstest]
    fn builder_rejects_dates_before_the_service_start(clock: FixtureClock) {
        let service = service(SetupFee::ManagedAccount);
        let builder = EntryBuilder::new(&service, &clock);
        let err = builder
            .build(
                &StatementEntry::MonthlyFee { month: day(2023, 12, 1), amount: money(1) },
                Some(day(2023, 12, 31)),
                "Amy",
            )
            .expect_err("before start");
        assert_eq!(err.to_string(), BEFORE_START_MESSAGE);
    }

    #[rstest]
    fn builder_rejects_kinds_outside_the_setup_fee(clock: FixtureClock) {
        let service = service(SetupFee::ManagedAccount);
        let builder = EntryBuilder::new(&service, &clock);
        let err = builder
            .build(
                &StatementEntry::PensionFee { amount: money(1) },
                Some(day(2024, 2, 1)),
                "Amy",
            )
            .expect_err("not allowed");
        assert!(matches!(err, LedgerError::KindNotAllowed { kind: StatementKind::PensionFee, .. }));
    }

    #[rstest]
    fn start_date_edge_is_accepted() {
        let service = service(SetupFee::Unspecified);
        assert_eq!(check_start_date(&service, day(2024, 1, 1)), Ok(()));
        let undated = Service::default();
        assert_eq!(check_start_date(&undated, day(1990, 1, 1)), Ok(()));
    }
}
