use sea_orm::sea_query::{Index, PostgresQueryBuilder};
use sea_orm::*;
use tracing::info;
use uuid::Uuid;

use crate::config::BootstrapConfig;
use crate::entity::user::Role;
use crate::entity::{answer, question, teacher_school, user};
use crate::models::shared::{is_valid_email, normalize_email};
use crate::utils::hash;

/// Ensure required database indexes exist.
///
/// Schema sync only creates single-column constraints, so composite and
/// lookup indexes are created here on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // One answer per (user, question); backs up the event_submission key.
    let stmt = Index::create()
        .if_not_exists()
        .unique()
        .name("idx_answer_user_question")
        .table(answer::Entity)
        .col(answer::Column::UserId)
        .col(answer::Column::QuestionId)
        .to_string(PostgresQueryBuilder);
    db.execute_unprepared(&stmt).await?;
    info!("Ensured index idx_answer_user_question exists");

    let lookups = [
        (
            "idx_answer_event_user",
            Index::create()
                .if_not_exists()
                .name("idx_answer_event_user")
                .table(answer::Entity)
                .col(answer::Column::EventId)
                .col(answer::Column::UserId)
                .to_string(PostgresQueryBuilder),
        ),
        (
            "idx_question_event_position",
            Index::create()
                .if_not_exists()
                .name("idx_question_event_position")
                .table(question::Entity)
                .col(question::Column::EventId)
                .col(question::Column::Position)
                .to_string(PostgresQueryBuilder),
        ),
        (
            "idx_teacher_school_school",
            Index::create()
                .if_not_exists()
                .name("idx_teacher_school_school")
                .table(teacher_school::Entity)
                .col(teacher_school::Column::SchoolId)
                .to_string(PostgresQueryBuilder),
        ),
    ];

    for (name, stmt) in lookups {
        match db.execute_unprepared(&stmt).await {
            Ok(_) => info!("Ensured index {} exists", name),
            Err(e) => tracing::warn!("Failed to create index {}: {}", name, e),
        }
    }

    Ok(())
}

/// Create the configured administrator if no account uses its email yet.
pub async fn ensure_admin(
    db: &DatabaseConnection,
    bootstrap: &BootstrapConfig,
) -> anyhow::Result<()> {
    let email = normalize_email(&bootstrap.admin_email);
    if !is_valid_email(&email) {
        anyhow::bail!("bootstrap.admin_email is not a valid email address");
    }
    if bootstrap.admin_password.len() < 8 {
        anyhow::bail!("bootstrap.admin_password must be at least 8 characters");
    }

    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(db)
        .await?;
    if let Some(existing) = existing {
        if existing.role != Role::Admin {
            tracing::warn!(%email, "Bootstrap email belongs to a non-admin account; skipping");
        }
        return Ok(());
    }

    let password = hash::hash_password(&bootstrap.admin_password)?;
    let now = chrono::Utc::now();
    let admin = user::ActiveModel {
        id: Set(Uuid::now_v7()),
        email: Set(email),
        password: Set(password),
        name: Set(bootstrap.admin_name.trim().to_string()),
        role: Set(Role::Admin),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let result = user::Entity::insert(admin)
        .on_conflict(
            sea_orm::sea_query::OnConflict::column(user::Column::Email)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await;

    match result {
        Ok(_) => info!("Seeded bootstrap administrator"),
        Err(DbErr::RecordNotInserted) => {}
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
