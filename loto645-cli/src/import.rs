use anyhow::{Context, Result, bail};
use loto645_db::rusqlite::Connection;
use serde::Serialize;
use std::path::Path;

use loto645_db::db::insert_draw;
use loto645_db::models::{Draw, validate_bonus, validate_draw};

const COL_INDEX: &str = "회차";
const COL_DATE: &str = "추첨일";
const COL_NUMBERS: &str = "당첨번호";
const COL_BONUS: &str = "보너스번호";

/// Position des colonnes utiles, résolue une fois depuis l'en-tête.
#[derive(Debug)]
struct Columns {
    index: usize,
    date: Option<usize>,
    numbers: NumberColumns,
    bonus: Option<usize>,
}

#[derive(Debug)]
enum NumberColumns {
    Split([usize; 6]),
    Joined(usize),
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);

        let index = find(COL_INDEX)
            .with_context(|| format!("Colonne '{}' absente de l'en-tête", COL_INDEX))?;

        let split: Vec<Option<usize>> = (1..=6).map(|i| find(&format!("{COL_NUMBERS}_{i}"))).collect();
        let numbers = if split.iter().all(Option::is_some) {
            let mut cols = [0usize; 6];
            for (slot, col) in cols.iter_mut().zip(split) {
                *slot = col.unwrap_or_default();
            }
            NumberColumns::Split(cols)
        } else if let Some(col) = find(COL_NUMBERS) {
            NumberColumns::Joined(col)
        } else {
            bail!("Colonnes des numéros absentes ('{COL_NUMBERS}_1..6' ou '{COL_NUMBERS}')");
        };

        Ok(Self {
            index,
            date: find(COL_DATE),
            numbers,
            bonus: find(COL_BONUS),
        })
    }
}

/// "1095회" ou "1095" → 1095
pub fn parse_draw_index(raw: &str) -> Result<u32> {
    let s = raw.trim().trim_end_matches('회').trim();
    s.parse::<u32>()
        .with_context(|| format!("Indice de tirage invalide: '{}'", raw))
}

/// "(2023.11.25)" → "2023-11-25"; une valeur vide reste vide.
pub fn parse_date(raw: &str) -> Result<String> {
    let s = raw.trim().trim_start_matches('(').trim_end_matches(')').trim();
    if s.is_empty() {
        return Ok(String::new());
    }
    let parts: Vec<&str> = s.split(['.', '-', '/']).collect();
    if parts.len() != 3 {
        bail!("Format de date invalide: '{}'", raw);
    }
    Ok(format!("{}-{}-{}", parts[0], parts[1], parts[2]))
}

/// Numéros séparés par des virgules ou des espaces.
pub fn parse_numbers(raw: &str) -> Result<[u8; 6]> {
    let nums = raw
        .split([',', ' '])
        .filter(|s| !s.trim().is_empty())
        .map(|s| {
            s.trim()
                .parse::<u8>()
                .with_context(|| format!("Numéro invalide: '{}'", s))
        })
        .collect::<Result<Vec<u8>>>()?;
    if nums.len() != 6 {
        bail!("6 numéros attendus, {} trouvés dans '{}'", nums.len(), raw);
    }
    Ok([nums[0], nums[1], nums[2], nums[3], nums[4], nums[5]])
}

/// Bonus absent, illisible ou hors 1-45 → `None`. Le tirage reste utilisable.
pub fn parse_bonus(raw: &str) -> Option<u8> {
    raw.trim()
        .parse::<u8>()
        .ok()
        .filter(|&b| validate_bonus(b).is_ok())
}

fn field(record: &csv::StringRecord, idx: usize) -> Result<&str> {
    record
        .get(idx)
        .map(str::trim)
        .with_context(|| format!("Champ manquant à l'index {}", idx))
}

fn parse_record(record: &csv::StringRecord, cols: &Columns) -> Result<Draw> {
    let get = |idx: usize| field(record, idx);

    let draw_index = parse_draw_index(get(cols.index)?)?;

    let date = match cols.date {
        Some(idx) => parse_date(record.get(idx).unwrap_or_default())?,
        None => String::new(),
    };

    let numbers = match &cols.numbers {
        NumberColumns::Split(idxs) => {
            let mut numbers = [0u8; 6];
            for (slot, &idx) in numbers.iter_mut().zip(idxs) {
                let s = get(idx)?;
                *slot = s
                    .parse::<u8>()
                    .with_context(|| format!("Impossible de parser '{}' (index {})", s, idx))?;
            }
            numbers
        }
        NumberColumns::Joined(idx) => parse_numbers(get(*idx)?)?,
    };

    let raw_bonus = cols.bonus.and_then(|idx| record.get(idx)).unwrap_or_default();
    let bonus = parse_bonus(raw_bonus);
    if bonus.is_none() && !raw_bonus.trim().is_empty() {
        log::warn!("Tirage {} : bonus invalide '{}', ignoré", draw_index, raw_bonus.trim());
    }

    let draw = Draw {
        draw_index,
        date,
        numbers,
        bonus,
    };
    validate_draw(&draw)?;
    Ok(draw)
}

#[derive(Debug, Default, Serialize)]
pub struct ImportResult {
    pub total_records: u32,
    pub inserted: u32,
    pub skipped: u32,
    pub errors: u32,
}

pub fn import_csv(conn: &Connection, path: &Path) -> Result<ImportResult> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Impossible d'ouvrir {:?}", path))?;

    let headers = reader.headers().context("En-tête CSV illisible")?.clone();
    let cols = Columns::from_headers(&headers)?;
    log::debug!("Colonnes détectées : {:?}", cols);

    let tx = conn.unchecked_transaction()
        .context("Impossible de démarrer la transaction")?;

    let mut result = ImportResult::default();

    for record_result in reader.records() {
        result.total_records += 1;
        match record_result {
            Ok(record) => {
                match parse_record(&record, &cols) {
                    Ok(draw) => {
                        match insert_draw(&tx, &draw) {
                            Ok(true) => result.inserted += 1,
                            Ok(false) => result.skipped += 1,
                            Err(e) => {
                                log::warn!("Erreur insertion tirage {}: {:#}", result.total_records, e);
                                result.errors += 1;
                            }
                        }
                    }
                    Err(e) => {
                        log::warn!("Erreur parsing ligne {}: {:#}", result.total_records, e);
                        result.errors += 1;
                    }
                }
            }
            Err(e) => {
                log::warn!("Erreur lecture ligne {}: {}", result.total_records, e);
                result.errors += 1;
            }
        }
    }

    tx.commit().context("Échec du commit")?;
    log::info!(
        "Import {:?} : {} insérés, {} doublons, {} erreurs",
        path,
        result.inserted,
        result.skipped,
        result.errors
    );
    Ok(result)
}
