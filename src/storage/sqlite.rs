//! SQLite storage backend

use super::traits::{
    AssetRepository, EntityRepository, OpenStore, PersistenceManager, StorageError, StorageResult,
};
use crate::model::{Asset, AssetCollection, AssetId, AssetTimestamps, EntityId, NamedEntity, Tag};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Table layout of a name-identified entity and its link table
trait EntityTable: NamedEntity {
    const TABLE: &'static str;
    const NAME_COLUMN: &'static str;
    const LINK_TABLE: &'static str;
    const LINK_COLUMN: &'static str;
}

impl EntityTable for Tag {
    const TABLE: &'static str = "tags";
    const NAME_COLUMN: &'static str = "label";
    const LINK_TABLE: &'static str = "asset_tags";
    const LINK_COLUMN: &'static str = "tag_id";
}

impl EntityTable for AssetCollection {
    const TABLE: &'static str = "collections";
    const NAME_COLUMN: &'static str = "title";
    const LINK_TABLE: &'static str = "asset_collections";
    const LINK_COLUMN: &'static str = "collection_id";
}

/// SQLite-backed store
///
/// One database file with tables for assets, tags, collections and the two
/// link tables. Tag labels and collection titles carry a `UNIQUE` constraint,
/// so `add` is an atomic insert-if-absent even across processes.
/// Thread-safe via internal mutex on the connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS assets (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                caption TEXT NOT NULL,
                timestamps_json TEXT NOT NULL
            );

            -- Labels and titles compare with BINARY collation (case-sensitive)
            CREATE TABLE IF NOT EXISTS tags (
                id TEXT PRIMARY KEY,
                label TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS collections (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS asset_tags (
                asset_id TEXT NOT NULL,
                tag_id TEXT NOT NULL,
                position INTEGER NOT NULL,
                PRIMARY KEY (asset_id, tag_id),
                FOREIGN KEY (asset_id) REFERENCES assets(id) ON DELETE CASCADE,
                FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS asset_collections (
                asset_id TEXT NOT NULL,
                collection_id TEXT NOT NULL,
                position INTEGER NOT NULL,
                PRIMARY KEY (asset_id, collection_id),
                FOREIGN KEY (asset_id) REFERENCES assets(id) ON DELETE CASCADE,
                FOREIGN KEY (collection_id) REFERENCES collections(id) ON DELETE CASCADE
            );

            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            "#,
        )?;
        Ok(())
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Persist a new asset (the creation flow). Every tag and collection the
    /// asset references must already be stored.
    pub fn add_asset(&self, asset: &Asset) -> StorageResult<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO assets (id, title, caption, timestamps_json) VALUES (?1, ?2, ?3, ?4)",
            params![
                asset.id.to_string(),
                asset.title(),
                asset.caption(),
                serde_json::to_string(&asset.timestamps)?,
            ],
        )?;
        write_links(&tx, asset)?;
        tx.commit()?;
        Ok(())
    }

    /// Load an asset with its tags and collections
    pub fn load_asset(&self, id: &AssetId) -> StorageResult<Option<Asset>> {
        let conn = self.conn();
        let row = conn
            .query_row(
                "SELECT title, caption, timestamps_json FROM assets WHERE id = ?1",
                params![id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        let Some((title, caption, timestamps_json)) = row else {
            return Ok(None);
        };

        let mut asset = Asset::with_id(*id);
        asset.set_title(title);
        asset.set_caption(caption);
        asset.timestamps = serde_json::from_str::<AssetTimestamps>(&timestamps_json)?;
        asset.set_tags(load_linked::<Tag>(&conn, id)?);
        asset.set_collections(load_linked::<AssetCollection>(&conn, id)?);
        Ok(Some(asset))
    }

    /// All tags, ordered by label
    pub fn list_tags(&self) -> StorageResult<Vec<Tag>> {
        list_entities(&self.conn())
    }

    /// All collections, ordered by title
    pub fn list_collections(&self) -> StorageResult<Vec<AssetCollection>> {
        list_entities(&self.conn())
    }
}

fn parse_uuid(raw: &str) -> StorageResult<Uuid> {
    Uuid::parse_str(raw).map_err(|e| StorageError::InvalidId(format!("{}: {}", raw, e)))
}

fn find_entity<E: EntityTable>(conn: &Connection, name: &str) -> StorageResult<Option<E>> {
    let sql = format!(
        "SELECT id, {col} FROM {table} WHERE {col} = ?1",
        col = E::NAME_COLUMN,
        table = E::TABLE
    );
    let row = conn
        .query_row(&sql, params![name], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })
        .optional()?;

    match row {
        Some((id, name)) => Ok(Some(E::restore(EntityId::from_uuid(parse_uuid(&id)?), name))),
        None => Ok(None),
    }
}

fn add_entity<E: EntityTable>(conn: &Connection, entity: E) -> StorageResult<Arc<E>> {
    let sql = format!(
        "INSERT INTO {table} (id, {col}) VALUES (?1, ?2) ON CONFLICT({col}) DO NOTHING",
        col = E::NAME_COLUMN,
        table = E::TABLE
    );
    conn.execute(&sql, params![entity.id().to_string(), entity.name()])?;

    // Re-read so a concurrent winner's row is what we hand back
    find_entity::<E>(conn, entity.name())?
        .map(Arc::new)
        .ok_or(StorageError::Database(rusqlite::Error::QueryReturnedNoRows))
}

fn list_entities<E: EntityTable>(conn: &Connection) -> StorageResult<Vec<E>> {
    let sql = format!(
        "SELECT id, {col} FROM {table} ORDER BY {col}",
        col = E::NAME_COLUMN,
        table = E::TABLE
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

    let mut entities = Vec::new();
    for row in rows {
        let (id, name) = row?;
        entities.push(E::restore(EntityId::from_uuid(parse_uuid(&id)?), name));
    }
    Ok(entities)
}

fn load_linked<E: EntityTable>(conn: &Connection, asset_id: &AssetId) -> StorageResult<Vec<Arc<E>>> {
    let sql = format!(
        "SELECT e.id, e.{col} FROM {link} l JOIN {table} e ON e.id = l.{link_col} \
         WHERE l.asset_id = ?1 ORDER BY l.position",
        col = E::NAME_COLUMN,
        table = E::TABLE,
        link = E::LINK_TABLE,
        link_col = E::LINK_COLUMN
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![asset_id.to_string()], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut entities = Vec::new();
    for row in rows {
        let (id, name) = row?;
        entities.push(Arc::new(E::restore(EntityId::from_uuid(parse_uuid(&id)?), name)));
    }
    Ok(entities)
}

fn replace_links<E: EntityTable>(tx: &Transaction<'_>, asset_id: &AssetId, entities: &[Arc<E>]) -> StorageResult<()> {
    let asset_id = asset_id.to_string();
    tx.execute(
        &format!("DELETE FROM {} WHERE asset_id = ?1", E::LINK_TABLE),
        params![asset_id],
    )?;

    let sql = format!(
        "INSERT INTO {} (asset_id, {}, position) VALUES (?1, ?2, ?3)",
        E::LINK_TABLE,
        E::LINK_COLUMN
    );
    let mut stmt = tx.prepare(&sql)?;
    for (position, entity) in entities.iter().enumerate() {
        stmt.execute(params![asset_id, entity.id().to_string(), position as i64])?;
    }
    Ok(())
}

fn write_links(tx: &Transaction<'_>, asset: &Asset) -> StorageResult<()> {
    replace_links(tx, &asset.id, asset.tags())?;
    replace_links(tx, &asset.id, asset.collections())?;
    Ok(())
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl EntityRepository<Tag> for SqliteStore {
    fn find_by_name(&self, name: &str) -> StorageResult<Option<Arc<Tag>>> {
        Ok(find_entity::<Tag>(&self.conn(), name)?.map(Arc::new))
    }

    fn add(&self, entity: Tag) -> StorageResult<Arc<Tag>> {
        add_entity(&self.conn(), entity)
    }
}

impl EntityRepository<AssetCollection> for SqliteStore {
    fn find_by_name(&self, name: &str) -> StorageResult<Option<Arc<AssetCollection>>> {
        Ok(find_entity::<AssetCollection>(&self.conn(), name)?.map(Arc::new))
    }

    fn add(&self, entity: AssetCollection) -> StorageResult<Arc<AssetCollection>> {
        add_entity(&self.conn(), entity)
    }
}

impl AssetRepository for SqliteStore {
    fn update(&self, asset: &Asset) -> StorageResult<()> {
        let mut timestamps = asset.timestamps.clone();
        timestamps.modified_at = Some(Utc::now());

        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let changed = tx.execute(
            "UPDATE assets SET title = ?2, caption = ?3, timestamps_json = ?4 WHERE id = ?1",
            params![
                asset.id.to_string(),
                asset.title(),
                asset.caption(),
                serde_json::to_string(&timestamps)?,
            ],
        )?;
        if changed == 0 {
            return Err(StorageError::AssetNotFound(asset.id.to_string()));
        }
        write_links(&tx, asset)?;
        tx.commit()?;
        Ok(())
    }
}

impl PersistenceManager for SqliteStore {
    fn is_new_object(&self, asset: &Asset) -> StorageResult<bool> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM assets WHERE id = ?1",
            params![asset.id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count == 0)
    }
}
