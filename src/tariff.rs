//! Tariff schedule parsing
//!
//! The regulated tariffs are published as semicolon-separated tables, one row
//! per (validity interval, contracted power). Dates are `DD/MM/YYYY` and
//! decimals use a comma. The fixed part is yearly and is normalised to a
//! monthly figure here.

use crate::contract::{ContractType, PricePeriod, TempoColor};
use crate::error::{Result, TarifError};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Serialize;

const DATE_FORMAT: &str = "%d/%m/%Y";

const COL_START: &str = "DATE_DEBUT";
const COL_END: &str = "DATE_FIN";
const COL_POWER: &str = "P_SOUSCRITE";
const COL_FIXED: &str = "PART_FIXE_TTC";

const BASE_COLUMNS: [&str; 1] = ["PART_VARIABLE_TTC"];
const HPHC_COLUMNS: [&str; 2] = ["PART_VARIABLE_HC_TTC", "PART_VARIABLE_HP_TTC"];
const TEMPO_COLUMNS: [&str; 6] = [
    "PART_VARIABLE_HCBleu_TTC",
    "PART_VARIABLE_HPBleu_TTC",
    "PART_VARIABLE_HCBlanc_TTC",
    "PART_VARIABLE_HPBlanc_TTC",
    "PART_VARIABLE_HCRouge_TTC",
    "PART_VARIABLE_HPRouge_TTC",
];

/// Off-peak / peak price pair in EUR/kWh
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeriodRates {
    pub hc: f64,
    pub hp: f64,
}

impl PeriodRates {
    pub fn get(&self, period: PricePeriod) -> f64 {
        match period {
            PricePeriod::OffPeak => self.hc,
            PricePeriod::Peak => self.hp,
        }
    }
}

/// Tempo prices per day color
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TempoRates {
    pub blue: PeriodRates,
    pub white: PeriodRates,
    pub red: PeriodRates,
}

impl TempoRates {
    /// Rates of a defined color; `None` for an undetermined day
    pub fn for_color(&self, color: TempoColor) -> Option<PeriodRates> {
        match color {
            TempoColor::Blue => Some(self.blue),
            TempoColor::White => Some(self.white),
            TempoColor::Red => Some(self.red),
            TempoColor::Undetermined => None,
        }
    }
}

/// Tax-inclusive figures of one schedule row. Fixed parts are monthly (EUR),
/// variable parts are EUR/kWh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "contract_type", rename_all = "lowercase")]
pub enum TariffFigures {
    Base {
        fixed_ttc: f64,
        variable_ttc: f64,
    },
    Hphc {
        fixed_ttc: f64,
        variable: PeriodRates,
    },
    Tempo {
        fixed_ttc: f64,
        variable: TempoRates,
    },
}

impl TariffFigures {
    pub fn contract_type(&self) -> ContractType {
        match self {
            Self::Base { .. } => ContractType::Base,
            Self::Hphc { .. } => ContractType::Hphc,
            Self::Tempo { .. } => ContractType::Tempo,
        }
    }

    /// Monthly subscription fee
    pub fn fixed_monthly_ttc(&self) -> f64 {
        match self {
            Self::Base { fixed_ttc, .. }
            | Self::Hphc { fixed_ttc, .. }
            | Self::Tempo { fixed_ttc, .. } => *fixed_ttc,
        }
    }

    /// Variable price for a period (and a color for Tempo contracts).
    ///
    /// The flat rate ignores both selectors. Tempo needs a defined color.
    pub fn variable(&self, period: PricePeriod, color: Option<TempoColor>) -> Option<f64> {
        match self {
            Self::Base { variable_ttc, .. } => Some(*variable_ttc),
            Self::Hphc { variable, .. } => Some(variable.get(period)),
            Self::Tempo { variable, .. } => color
                .and_then(|c| variable.for_color(c))
                .map(|rates| rates.get(period)),
        }
    }

    /// Figures under their published field keys (`base_variable_ttc`,
    /// `tempo_variable_hc_rouge_ttc`, ...)
    pub fn named_fields(&self) -> Vec<(String, f64)> {
        let prefix = self.contract_type().as_str();
        let mut fields = vec![(format!("{}_fixe_ttc", prefix), self.fixed_monthly_ttc())];
        match self {
            Self::Base { variable_ttc, .. } => {
                fields.push((format!("{}_variable_ttc", prefix), *variable_ttc));
            }
            Self::Hphc { variable, .. } => {
                for period in [PricePeriod::OffPeak, PricePeriod::Peak] {
                    fields.push((
                        format!("{}_variable_{}_ttc", prefix, period.code()),
                        variable.get(period),
                    ));
                }
            }
            Self::Tempo { variable, .. } => {
                for color in [TempoColor::Blue, TempoColor::White, TempoColor::Red] {
                    let Some(rates) = variable.for_color(color) else {
                        continue;
                    };
                    for period in [PricePeriod::OffPeak, PricePeriod::Peak] {
                        fields.push((
                            format!(
                                "{}_variable_{}_{}_ttc",
                                prefix,
                                period.code(),
                                color.label()
                            ),
                            rates.get(period),
                        ));
                    }
                }
            }
        }
        fields
    }
}

/// Column positions resolved from the header row
struct Columns {
    start: usize,
    end: usize,
    power: usize,
    fixed: usize,
    variable: Vec<usize>,
}

impl Columns {
    fn resolve(headers: &StringRecord, contract_type: ContractType) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| TarifError::parse(format!("schedule has no {} column", name)))
        };
        let variable_names: &[&str] = match contract_type {
            ContractType::Base => &BASE_COLUMNS,
            ContractType::Hphc => &HPHC_COLUMNS,
            ContractType::Tempo => &TEMPO_COLUMNS,
        };
        Ok(Self {
            start: find(COL_START)?,
            end: find(COL_END)?,
            power: find(COL_POWER)?,
            fixed: find(COL_FIXED)?,
            variable: variable_names
                .iter()
                .map(|&name| find(name))
                .collect::<Result<Vec<_>>>()?,
        })
    }
}

/// Select the row in effect on `today` for `contract_power` and extract its
/// figures.
///
/// Rows are examined from the last one up, so when validity intervals overlap
/// the most recently declared row wins. `Ok(None)` means no row matched; the
/// caller keeps whatever figures it already had.
pub fn parse_schedule(
    raw: &[u8],
    contract_type: ContractType,
    contract_power: &str,
    today: NaiveDate,
) -> Result<Option<TariffFigures>> {
    let text = std::str::from_utf8(raw)
        .map_err(|e| TarifError::parse(format!("schedule is not UTF-8: {}", e)))?;
    let text = text.trim_start_matches('\u{feff}');

    let mut reader = ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let columns = Columns::resolve(reader.headers()?, contract_type)?;
    let rows = reader
        .records()
        .collect::<std::result::Result<Vec<_>, csv::Error>>()?;

    let power = contract_power.trim();
    for row in rows.iter().rev() {
        let start = field(row, columns.start);
        if start.is_empty() {
            continue;
        }
        if today < parse_date(COL_START, start)? {
            continue;
        }
        let end = field(row, columns.end);
        if !end.is_empty() && parse_date(COL_END, end)? < today {
            continue;
        }
        if field(row, columns.power) != power {
            continue;
        }
        return figures_from_row(row, &columns, contract_type).map(Some);
    }

    Ok(None)
}

fn figures_from_row(
    row: &StringRecord,
    columns: &Columns,
    contract_type: ContractType,
) -> Result<TariffFigures> {
    let fixed_ttc = parse_decimal(COL_FIXED, field(row, columns.fixed))? / 12.0;
    let variable = columns
        .variable
        .iter()
        .map(|&idx| parse_decimal("PART_VARIABLE", field(row, idx)))
        .collect::<Result<Vec<_>>>()?;

    let figures = match (contract_type, variable.as_slice()) {
        (ContractType::Base, [variable_ttc]) => TariffFigures::Base {
            fixed_ttc,
            variable_ttc: *variable_ttc,
        },
        (ContractType::Hphc, [hc, hp]) => TariffFigures::Hphc {
            fixed_ttc,
            variable: PeriodRates { hc: *hc, hp: *hp },
        },
        (ContractType::Tempo, [hc_blue, hp_blue, hc_white, hp_white, hc_red, hp_red]) => {
            TariffFigures::Tempo {
                fixed_ttc,
                variable: TempoRates {
                    blue: PeriodRates {
                        hc: *hc_blue,
                        hp: *hp_blue,
                    },
                    white: PeriodRates {
                        hc: *hc_white,
                        hp: *hp_white,
                    },
                    red: PeriodRates {
                        hc: *hc_red,
                        hp: *hp_red,
                    },
                },
            }
        }
        _ => {
            return Err(TarifError::parse(format!(
                "unexpected variable column count for {}",
                contract_type
            )));
        }
    };
    Ok(figures)
}

fn field(row: &StringRecord, idx: usize) -> &str {
    row.get(idx).unwrap_or("")
}

fn parse_date(column: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| TarifError::parse(format!("invalid {} date '{}'", column, value)))
}

/// Parse a decimal written with a comma separator
fn parse_decimal(column: &str, value: &str) -> Result<f64> {
    value
        .replace(',', ".")
        .parse::<f64>()
        .map_err(|_| TarifError::parse(format!("invalid {} number '{}'", column, value)))
}
