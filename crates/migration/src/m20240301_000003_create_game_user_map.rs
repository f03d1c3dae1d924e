//! Create `game_user_map` table with FK to `auth_user`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GameUserMap::Table)
                    .if_not_exists()
                    .col(pk_auto(GameUserMap::Id))
                    .col(integer(GameUserMap::UserId).not_null())
                    .col(timestamp_with_time_zone(GameUserMap::CreatedOn).not_null())
                    .col(string_len(GameUserMap::Game, 200).not_null().default(""))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_game_user_map_user")
                            .from(GameUserMap::Table, GameUserMap::UserId)
                            .to(AuthUser::Table, AuthUser::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(GameUserMap::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum GameUserMap { Table, Id, UserId, CreatedOn, Game }

#[derive(DeriveIden)]
enum AuthUser { Table, Id }
