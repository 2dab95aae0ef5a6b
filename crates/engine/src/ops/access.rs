//! Membership checks.
//!
//! The requesting user must belong to the group (`Forbidden` otherwise) and
//! every named participant must belong to it too (`InvalidSplit`
//! otherwise). Participants are checked with one query as a set difference.

use std::collections::HashSet;

use sea_orm::{DatabaseTransaction, QueryFilter, prelude::*};

use crate::{Currency, EngineError, ResultEngine, group_members, groups};

use super::Engine;

impl Engine {
    pub(super) async fn require_group(
        &self,
        db: &DatabaseTransaction,
        group_id: &str,
    ) -> ResultEngine<(groups::Model, Currency)> {
        let model = groups::Entity::find_by_id(group_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("group not exists".to_string()))?;
        let currency = Currency::try_from(model.currency.as_str())?;
        Ok((model, currency))
    }

    async fn is_member(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
        group_id: &str,
    ) -> ResultEngine<bool> {
        group_members::Entity::find_by_id((group_id.to_string(), user_id.to_string()))
            .one(db)
            .await
            .map(|row| row.is_some())
            .map_err(Into::into)
    }

    /// Fails with `Forbidden` unless `user_id` belongs to `group_id`.
    pub(super) async fn assert_member(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
        group_id: &str,
    ) -> ResultEngine<()> {
        if !self.is_member(db, user_id, group_id).await? {
            return Err(EngineError::Forbidden(
                "user is not a member of the group".to_string(),
            ));
        }
        Ok(())
    }

    /// Fails with `InvalidSplit` if any of `participant_ids` lacks a
    /// membership in `group_id`. The error does not say which one.
    pub(super) async fn assert_all_members(
        &self,
        db: &DatabaseTransaction,
        participant_ids: &[&str],
        group_id: &str,
    ) -> ResultEngine<()> {
        let wanted: HashSet<&str> = participant_ids.iter().copied().collect();
        let found: HashSet<String> = group_members::Entity::find()
            .filter(group_members::Column::GroupId.eq(group_id.to_string()))
            .filter(group_members::Column::UserId.is_in(wanted.iter().map(|id| String::from(*id))))
            .all(db)
            .await?
            .into_iter()
            .map(|m| m.user_id)
            .collect();

        if wanted.iter().any(|id| !found.contains(*id)) {
            return Err(EngineError::InvalidSplit(
                "some participants are not group members".to_string(),
            ));
        }
        Ok(())
    }

    /// Usernames of all group members, ordered.
    pub(super) async fn group_member_ids(
        &self,
        db: &DatabaseTransaction,
        group_id: &str,
    ) -> ResultEngine<Vec<String>> {
        let mut ids: Vec<String> = group_members::Entity::find()
            .filter(group_members::Column::GroupId.eq(group_id.to_string()))
            .all(db)
            .await?
            .into_iter()
            .map(|m| m.user_id)
            .collect();
        ids.sort();
        Ok(ids)
    }
}
