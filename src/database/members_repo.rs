// Family members repository for Trip Planner

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::models::{FamilyMember, MemberPatch};
use super::DatabaseManager;
use crate::error::{Result, TripError};

impl DatabaseManager {
    pub fn get_member(&self, id: &str) -> Result<Option<FamilyMember>> {
        self.with_connection(|conn| get_member_impl(conn, id))
    }

    /// All members in the order they were first stored
    pub fn get_all_members(&self) -> Result<Vec<FamilyMember>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare("SELECT id, name, emoji, active FROM members ORDER BY rowid ASC")?;
            let members = stmt.query_map([], member_from_row)?;
            Ok(members.collect::<std::result::Result<Vec<_>, _>>()?)
        })
    }

    pub fn get_active_members(&self) -> Result<Vec<FamilyMember>> {
        Ok(self
            .get_all_members()?
            .into_iter()
            .filter(|m| m.active)
            .collect())
    }

    /// Insert or fully replace a member, including its active flag
    pub fn upsert_member(&self, member: &FamilyMember) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute(
                r#"
                INSERT INTO members (id, name, emoji, active) VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    emoji = excluded.emoji,
                    active = excluded.active
                "#,
                params![member.id, member.name, member.emoji, member.active as i32],
            )?;
            Ok(())
        })
    }

    /// Insert a member, or refresh name and emoji of an existing one while
    /// keeping its stored active flag
    pub fn upsert_member_keep_active(&self, member: &FamilyMember) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute(
                r#"
                INSERT INTO members (id, name, emoji, active) VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    emoji = excluded.emoji
                "#,
                params![member.id, member.name, member.emoji, member.active as i32],
            )?;
            Ok(())
        })
    }

    pub fn update_member(&self, id: &str, patch: &MemberPatch) -> Result<FamilyMember> {
        self.with_connection(|conn| {
            let mut member =
                get_member_impl(conn, id)?.ok_or_else(|| TripError::not_found("members", id))?;

            if let Some(ref name) = patch.name {
                member.name = name.clone();
            }
            if let Some(ref emoji) = patch.emoji {
                member.emoji = emoji.clone();
            }
            if let Some(active) = patch.active {
                member.active = active;
            }

            conn.execute(
                "UPDATE members SET name = ?1, emoji = ?2, active = ?3 WHERE id = ?4",
                params![member.name, member.emoji, member.active as i32, member.id],
            )?;
            Ok(member)
        })
    }
}

fn member_from_row(row: &Row<'_>) -> rusqlite::Result<FamilyMember> {
    Ok(FamilyMember {
        id: row.get(0)?,
        name: row.get(1)?,
        emoji: row.get(2)?,
        active: row.get::<_, i32>(3)? != 0,
    })
}

fn get_member_impl(conn: &Connection, id: &str) -> Result<Option<FamilyMember>> {
    let mut stmt = conn.prepare("SELECT id, name, emoji, active FROM members WHERE id = ?")?;
    Ok(stmt.query_row(params![id], member_from_row).optional()?)
}
