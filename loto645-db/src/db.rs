use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;

use crate::models::{Draw, DrawHistory};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS draws (
    draw_index  INTEGER PRIMARY KEY,
    date        TEXT NOT NULL DEFAULT '',
    number_1    INTEGER NOT NULL,
    number_2    INTEGER NOT NULL,
    number_3    INTEGER NOT NULL,
    number_4    INTEGER NOT NULL,
    number_5    INTEGER NOT NULL,
    number_6    INTEGER NOT NULL,
    bonus       INTEGER
);
";

const SELECT_COLUMNS: &str =
    "draw_index, date, number_1, number_2, number_3, number_4, number_5, number_6, bonus";

pub fn db_path() -> std::path::PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("loto645.db");
    path
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Impossible de créer le répertoire {:?}", parent))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Impossible d'ouvrir la base {:?}", path))?;
    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
        .context("Échec de la migration")?;
    Ok(())
}

pub fn insert_draw(conn: &Connection, draw: &Draw) -> Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO draws (draw_index, date, number_1, number_2, number_3, number_4, number_5, number_6, bonus)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        rusqlite::params![
            draw.draw_index,
            draw.date,
            draw.numbers[0],
            draw.numbers[1],
            draw.numbers[2],
            draw.numbers[3],
            draw.numbers[4],
            draw.numbers[5],
            draw.bonus,
        ],
    ).context("Échec de l'insertion")?;
    Ok(changed > 0)
}

/// Entier stocké hors de la plage du type cible → valeur sentinelle 0, que la
/// validation de `DrawHistory` rejette. Une base éditée à la main ne bloque
/// donc pas la lecture de tout l'historique.
fn stored_int<T: TryFrom<i64>>(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Option<T>> {
    let value = row.get_ref(idx)?;
    if matches!(value, rusqlite::types::ValueRef::Null) {
        return Ok(None);
    }
    let converted = value.as_i64().ok().and_then(|v| T::try_from(v).ok());
    if converted.is_none() {
        log::warn!("Valeur illisible en colonne {} : {:?}", idx, value);
    }
    Ok(converted)
}

fn stored_number(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<u8> {
    Ok(stored_int::<u8>(row, idx)?.unwrap_or(0))
}

fn row_to_draw(row: &rusqlite::Row<'_>) -> rusqlite::Result<Draw> {
    Ok(Draw {
        draw_index: stored_int::<u32>(row, 0)?.unwrap_or(0),
        date: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        numbers: [
            stored_number(row, 2)?,
            stored_number(row, 3)?,
            stored_number(row, 4)?,
            stored_number(row, 5)?,
            stored_number(row, 6)?,
            stored_number(row, 7)?,
        ],
        bonus: stored_int::<u8>(row, 8)?,
    })
}

/// Derniers tirages, du plus récent au plus ancien.
pub fn fetch_last_draws(conn: &Connection, limit: u32) -> Result<Vec<Draw>> {
    let sql = format!("SELECT {SELECT_COLUMNS} FROM draws ORDER BY draw_index DESC LIMIT ?1");
    let mut stmt = conn.prepare(&sql)?;
    let draws = stmt
        .query_map([limit], row_to_draw)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(draws)
}

/// Historique complet, validé et trié par indice croissant.
pub fn fetch_history(conn: &Connection) -> Result<DrawHistory> {
    let sql = format!("SELECT {SELECT_COLUMNS} FROM draws ORDER BY draw_index ASC");
    let mut stmt = conn.prepare(&sql)?;
    let draws = stmt
        .query_map([], row_to_draw)?
        .collect::<Result<Vec<_>, _>>()
        .context("Lecture de l'historique impossible")?;
    Ok(DrawHistory::from_draws(draws))
}

pub fn count_draws(conn: &Connection) -> Result<u32> {
    let count: u32 = conn.query_row("SELECT COUNT(*) FROM draws", [], |row| row.get(0))?;
    Ok(count)
}

pub fn latest_draw_index(conn: &Connection) -> Result<u32> {
    let latest: Option<u32> =
        conn.query_row("SELECT MAX(draw_index) FROM draws", [], |row| row.get(0))?;
    Ok(latest.unwrap_or(0))
}
