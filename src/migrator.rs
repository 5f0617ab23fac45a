use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_quote_submissions_table::Migration),
            Box::new(m20240101_000002_create_quote_contacts_table::Migration),
            Box::new(m20240101_000003_create_quote_pickup_addresses_table::Migration),
            Box::new(m20240101_000004_create_quote_delivery_addresses_table::Migration),
            Box::new(m20240101_000005_create_quote_shipment_items_table::Migration),
        ]
    }
}

#[derive(DeriveIden, Clone, Copy)]
enum QuoteSubmissions {
    Table,
    Id,
    Status,
    ShipmentItemsCount,
    CreatedAt,
    UpdatedAt,
}

/// Columns every child table shares
#[derive(DeriveIden, Clone, Copy)]
enum Child {
    Id,
    SubmissionId,
    Name,
    CreatedAt,
    UpdatedAt,
}

fn child_table(table: impl IntoIden + Clone + 'static, fk_name: &str) -> TableCreateStatement {
    Table::create()
        .table(table.clone())
        .if_not_exists()
        .col(
            ColumnDef::new(Child::Id)
                .integer()
                .not_null()
                .auto_increment()
                .primary_key(),
        )
        .col(ColumnDef::new(Child::SubmissionId).integer().not_null())
        .col(
            ColumnDef::new(Child::CreatedAt)
                .timestamp_with_time_zone()
                .not_null(),
        )
        .col(
            ColumnDef::new(Child::UpdatedAt)
                .timestamp_with_time_zone()
                .not_null(),
        )
        .foreign_key(
            ForeignKey::create()
                .name(fk_name)
                .from(table, Child::SubmissionId)
                .to(QuoteSubmissions::Table, QuoteSubmissions::Id)
                .on_delete(ForeignKeyAction::Cascade)
                .on_update(ForeignKeyAction::Cascade),
        )
        .to_owned()
}

fn submission_index(
    table: impl IntoIden + 'static,
    name: &str,
    unique: bool,
) -> IndexCreateStatement {
    let mut index = Index::create();
    index
        .if_not_exists()
        .name(name)
        .table(table)
        .col(Child::SubmissionId);
    if unique {
        index.unique();
    }
    index.to_owned()
}

mod m20240101_000001_create_quote_submissions_table {
    use super::QuoteSubmissions;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_quote_submissions_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(QuoteSubmissions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(QuoteSubmissions::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(QuoteSubmissions::Status)
                                .string()
                                .not_null()
                                .default("open"),
                        )
                        .col(
                            ColumnDef::new(QuoteSubmissions::ShipmentItemsCount)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(QuoteSubmissions::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(QuoteSubmissions::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(QuoteSubmissions::Table).to_owned())
                .await
        }
    }
}

mod m20240101_000002_create_quote_contacts_table {
    use super::{child_table, submission_index, Child};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_quote_contacts_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    child_table(QuoteContacts::Table, "fk_quote_contacts_submission_id")
                        .col(ColumnDef::new(Child::Name).string().not_null())
                        .col(ColumnDef::new(QuoteContacts::Email).string().null())
                        .col(ColumnDef::new(QuoteContacts::PhoneNumber).string().null())
                        .col(ColumnDef::new(QuoteContacts::Title).string().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(submission_index(
                    QuoteContacts::Table,
                    "idx_quote_contacts_submission_id",
                    true,
                ))
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(QuoteContacts::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden, Clone, Copy)]
    enum QuoteContacts {
        Table,
        Email,
        PhoneNumber,
        Title,
    }
}

mod m20240101_000003_create_quote_pickup_addresses_table {
    use super::{child_table, submission_index, Child};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_quote_pickup_addresses_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    child_table(
                        QuotePickupAddresses::Table,
                        "fk_quote_pickup_addresses_submission_id",
                    )
                    .col(ColumnDef::new(Child::Name).string().null())
                    .col(ColumnDef::new(QuotePickupAddresses::Lat).double().not_null())
                    .col(ColumnDef::new(QuotePickupAddresses::Lon).double().not_null())
                    .to_owned(),
                )
                .await?;

            manager
                .create_index(submission_index(
                    QuotePickupAddresses::Table,
                    "idx_quote_pickup_addresses_submission_id",
                    true,
                ))
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(QuotePickupAddresses::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden, Clone, Copy)]
    enum QuotePickupAddresses {
        Table,
        Lat,
        Lon,
    }
}

mod m20240101_000004_create_quote_delivery_addresses_table {
    use super::{child_table, submission_index, Child};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_quote_delivery_addresses_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    child_table(
                        QuoteDeliveryAddresses::Table,
                        "fk_quote_delivery_addresses_submission_id",
                    )
                    .col(ColumnDef::new(Child::Name).string().null())
                    .col(ColumnDef::new(QuoteDeliveryAddresses::Lat).double().not_null())
                    .col(ColumnDef::new(QuoteDeliveryAddresses::Lon).double().not_null())
                    .to_owned(),
                )
                .await?;

            manager
                .create_index(submission_index(
                    QuoteDeliveryAddresses::Table,
                    "idx_quote_delivery_addresses_submission_id",
                    true,
                ))
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(
                    Table::drop()
                        .table(QuoteDeliveryAddresses::Table)
                        .to_owned(),
                )
                .await
        }
    }

    #[derive(DeriveIden, Clone, Copy)]
    enum QuoteDeliveryAddresses {
        Table,
        Lat,
        Lon,
    }
}

mod m20240101_000005_create_quote_shipment_items_table {
    use super::{child_table, submission_index};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_quote_shipment_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    child_table(
                        QuoteShipmentItems::Table,
                        "fk_quote_shipment_items_submission_id",
                    )
                    .col(ColumnDef::new(QuoteShipmentItems::Width).double().not_null())
                    .col(ColumnDef::new(QuoteShipmentItems::Length).double().not_null())
                    .col(ColumnDef::new(QuoteShipmentItems::Height).double().not_null())
                    .col(ColumnDef::new(QuoteShipmentItems::Weight).double().not_null())
                    .col(ColumnDef::new(QuoteShipmentItems::WeightUnit).string().null())
                    .col(ColumnDef::new(QuoteShipmentItems::DimensionUnit).string().null())
                    .col(ColumnDef::new(QuoteShipmentItems::NumberOfItem).integer().null())
                    .to_owned(),
                )
                .await?;

            manager
                .create_index(submission_index(
                    QuoteShipmentItems::Table,
                    "idx_quote_shipment_items_submission_id",
                    false,
                ))
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(QuoteShipmentItems::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden, Clone, Copy)]
    enum QuoteShipmentItems {
        Table,
        Width,
        Length,
        Height,
        Weight,
        WeightUnit,
        DimensionUnit,
        NumberOfItem,
    }
}
