use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Courses {
    Table,
    Id,
    CommunityId,
    Name,
    Description,
    Type,
    Level,
    CoverImage,
    Published,
    CreatedAt,
}

#[derive(DeriveIden)]
enum CourseFiles {
    Table,
    Id,
    CourseId,
    Name,
    CreatedAt,
}

#[derive(DeriveIden)]
enum CourseLessons {
    Table,
    Id,
    FileId,
    Title,
    Duration,
    Points,
    Content,
    VideoUrl,
    OrderIndex,
    Published,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Communities {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Courses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Courses::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Courses::CommunityId).integer().not_null())
                    .col(ColumnDef::new(Courses::Name).string_len(200).not_null())
                    .col(ColumnDef::new(Courses::Description).text().null())
                    .col(
                        ColumnDef::new(Courses::Type)
                            .string_len(10)
                            .null()
                            .check(Expr::col(Courses::Type).is_in(["paid", "free"])),
                    )
                    .col(
                        ColumnDef::new(Courses::Level)
                            .string_len(20)
                            .null()
                            .check(
                                Expr::col(Courses::Level)
                                    .is_in(["Beginner", "Intermediate", "Advanced"]),
                            ),
                    )
                    .col(ColumnDef::new(Courses::CoverImage).string_len(1000).null())
                    .col(
                        ColumnDef::new(Courses::Published)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Courses::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_courses_community_id")
                            .from(Courses::Table, Courses::CommunityId)
                            .to(Communities::Table, Communities::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Files and lessons are removed explicitly by the cascade operations;
        // RESTRICT keeps a stray DELETE from orphaning children.
        manager
            .create_table(
                Table::create()
                    .table(CourseFiles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CourseFiles::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CourseFiles::CourseId).integer().not_null())
                    .col(ColumnDef::new(CourseFiles::Name).string_len(200).not_null())
                    .col(
                        ColumnDef::new(CourseFiles::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_course_files_course_id")
                            .from(CourseFiles::Table, CourseFiles::CourseId)
                            .to(Courses::Table, Courses::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CourseLessons::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CourseLessons::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CourseLessons::FileId).integer().not_null())
                    .col(ColumnDef::new(CourseLessons::Title).string_len(300).not_null())
                    .col(ColumnDef::new(CourseLessons::Duration).string_len(50).null())
                    .col(ColumnDef::new(CourseLessons::Points).integer().null())
                    .col(ColumnDef::new(CourseLessons::Content).text().null())
                    .col(ColumnDef::new(CourseLessons::VideoUrl).string_len(1000).null())
                    .col(ColumnDef::new(CourseLessons::OrderIndex).integer().not_null())
                    .col(
                        ColumnDef::new(CourseLessons::Published)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(CourseLessons::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_course_lessons_file_id")
                            .from(CourseLessons::Table, CourseLessons::FileId)
                            .to(CourseFiles::Table, CourseFiles::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_course_lessons_file_order")
                    .table(CourseLessons::Table)
                    .col(CourseLessons::FileId)
                    .col(CourseLessons::OrderIndex)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CourseLessons::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CourseFiles::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Courses::Table).to_owned())
            .await
    }
}
