use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Communities {
    Table,
    Id,
    Name,
    Description,
    Type,
    Language,
    MemberCount,
    CreatedAt,
    UpdatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Communities::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Communities::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Communities::Name).string_len(200).not_null())
                    .col(ColumnDef::new(Communities::Description).text().null())
                    .col(ColumnDef::new(Communities::Type).string_len(50).null())
                    .col(ColumnDef::new(Communities::Language).string_len(50).null())
                    .col(
                        ColumnDef::new(Communities::MemberCount)
                            .integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(Communities::MemberCount).gte(0)),
                    )
                    .col(
                        ColumnDef::new(Communities::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Communities::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Communities::Table).to_owned())
            .await
    }
}
