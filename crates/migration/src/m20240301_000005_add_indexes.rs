use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // GameUserMap: lookups and cascades by owner
        manager
            .create_index(
                Index::create()
                    .name("idx_game_user_map_user")
                    .table(GameUserMap::Table)
                    .col(GameUserMap::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_game_user_map_user")
                    .table(GameUserMap::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum GameUserMap { Table, UserId }
