use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_work_orders_table::Migration),
            Box::new(m20240301_000002_create_production_batches_table::Migration),
            Box::new(m20240301_000003_create_qc_records_table::Migration),
            Box::new(m20240301_000004_create_external_tables::Migration),
            Box::new(m20240301_000005_create_cartons_table::Migration),
            Box::new(m20240301_000006_create_production_logs_table::Migration),
            Box::new(m20240301_000007_create_instruments_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240301_000001_create_work_orders_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000001_create_work_orders_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(WorkOrders::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(WorkOrders::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(WorkOrders::OrderNumber).string().not_null())
                        .col(ColumnDef::new(WorkOrders::Customer).string())
                        .col(ColumnDef::new(WorkOrders::ItemCode).string())
                        .col(ColumnDef::new(WorkOrders::Quantity).integer().not_null())
                        .col(ColumnDef::new(WorkOrders::DueDate).timestamp_with_time_zone())
                        .col(ColumnDef::new(WorkOrders::GrossWeightPerPc).decimal())
                        .col(
                            ColumnDef::new(WorkOrders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WorkOrders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_work_orders_order_number")
                        .table(WorkOrders::Table)
                        .col(WorkOrders::OrderNumber)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(WorkOrders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum WorkOrders {
        Table,
        Id,
        OrderNumber,
        Customer,
        ItemCode,
        Quantity,
        DueDate,
        GrossWeightPerPc,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000002_create_production_batches_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000002_create_production_batches_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ProductionBatches::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductionBatches::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductionBatches::WorkOrderId).uuid().not_null())
                        .col(
                            ColumnDef::new(ProductionBatches::BatchNumber)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductionBatches::TriggerReason)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductionBatches::PreviousBatchId).uuid())
                        .col(
                            ColumnDef::new(ProductionBatches::StartedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductionBatches::EndedAt).timestamp_with_time_zone())
                        .col(ColumnDef::new(ProductionBatches::StageType).string().not_null())
                        .col(ColumnDef::new(ProductionBatches::BatchStatus).string().not_null())
                        .col(
                            ColumnDef::new(ProductionBatches::StageEnteredAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductionBatches::ExternalProcessType).string())
                        .col(ColumnDef::new(ProductionBatches::ExternalPartnerId).uuid())
                        .col(
                            ColumnDef::new(ProductionBatches::ExternalSentAt)
                                .timestamp_with_time_zone(),
                        )
                        .col(
                            ColumnDef::new(ProductionBatches::ExternalReturnedAt)
                                .timestamp_with_time_zone(),
                        )
                        .col(
                            ColumnDef::new(ProductionBatches::RequiresQcOnReturn)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(ProductionBatches::PostExternalQcStatus).string())
                        .col(
                            ColumnDef::new(ProductionBatches::BatchQuantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ProductionBatches::ProducedQty)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ProductionBatches::QcRejectedQty)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ProductionBatches::QcApprovedQty)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ProductionBatches::QcMaterialStatus)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductionBatches::QcMaterialApprovedBy).uuid())
                        .col(
                            ColumnDef::new(ProductionBatches::QcMaterialApprovedAt)
                                .timestamp_with_time_zone(),
                        )
                        .col(
                            ColumnDef::new(ProductionBatches::QcFirstPieceStatus)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductionBatches::QcFirstPieceApprovedBy).uuid())
                        .col(
                            ColumnDef::new(ProductionBatches::QcFirstPieceApprovedAt)
                                .timestamp_with_time_zone(),
                        )
                        .col(
                            ColumnDef::new(ProductionBatches::QcFinalStatus)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductionBatches::QcFinalApprovedBy).uuid())
                        .col(
                            ColumnDef::new(ProductionBatches::QcFinalApprovedAt)
                                .timestamp_with_time_zone(),
                        )
                        .col(
                            ColumnDef::new(ProductionBatches::ProductionAllowed)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(ProductionBatches::DispatchAllowed)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(ProductionBatches::RowVersion)
                                .big_integer()
                                .not_null()
                                .default(1),
                        )
                        .col(
                            ColumnDef::new(ProductionBatches::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductionBatches::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_production_batches_work_order")
                                .from(ProductionBatches::Table, ProductionBatches::WorkOrderId)
                                .to(
                                    super::m20240301_000001_create_work_orders_table::WorkOrders::Table,
                                    super::m20240301_000001_create_work_orders_table::WorkOrders::Id,
                                ),
                        )
                        .to_owned(),
                )
                .await?;

            // One batch per (work order, batch number); racing creates
            // surface as storage conflicts instead of duplicate batches.
            manager
                .create_index(
                    Index::create()
                        .name("idx_production_batches_wo_number")
                        .table(ProductionBatches::Table)
                        .col(ProductionBatches::WorkOrderId)
                        .col(ProductionBatches::BatchNumber)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_production_batches_open")
                        .table(ProductionBatches::Table)
                        .col(ProductionBatches::WorkOrderId)
                        .col(ProductionBatches::EndedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ProductionBatches::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum ProductionBatches {
        Table,
        Id,
        WorkOrderId,
        BatchNumber,
        TriggerReason,
        PreviousBatchId,
        StartedAt,
        EndedAt,
        StageType,
        BatchStatus,
        StageEnteredAt,
        ExternalProcessType,
        ExternalPartnerId,
        ExternalSentAt,
        ExternalReturnedAt,
        RequiresQcOnReturn,
        PostExternalQcStatus,
        BatchQuantity,
        ProducedQty,
        QcRejectedQty,
        QcApprovedQty,
        QcMaterialStatus,
        QcMaterialApprovedBy,
        QcMaterialApprovedAt,
        QcFirstPieceStatus,
        QcFirstPieceApprovedBy,
        QcFirstPieceApprovedAt,
        QcFinalStatus,
        QcFinalApprovedBy,
        QcFinalApprovedAt,
        ProductionAllowed,
        DispatchAllowed,
        RowVersion,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000003_create_qc_records_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000003_create_qc_records_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(QcRecords::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(QcRecords::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(QcRecords::BatchId).uuid())
                        .col(ColumnDef::new(QcRecords::WorkOrderId).uuid().not_null())
                        .col(ColumnDef::new(QcRecords::QcType).string().not_null())
                        .col(ColumnDef::new(QcRecords::Result).string().not_null())
                        .col(ColumnDef::new(QcRecords::InspectedQuantity).integer())
                        .col(ColumnDef::new(QcRecords::WaiveReason).string())
                        .col(ColumnDef::new(QcRecords::Remarks).string())
                        .col(ColumnDef::new(QcRecords::ApprovedBy).uuid())
                        .col(
                            ColumnDef::new(QcRecords::ApprovedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(QcRecords::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_qc_records_batch_created")
                        .table(QcRecords::Table)
                        .col(QcRecords::BatchId)
                        .col(QcRecords::CreatedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(QcRecords::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum QcRecords {
        Table,
        Id,
        BatchId,
        WorkOrderId,
        QcType,
        Result,
        InspectedQuantity,
        WaiveReason,
        Remarks,
        ApprovedBy,
        ApprovedAt,
        CreatedAt,
    }
}

mod m20240301_000004_create_external_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000004_create_external_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ExternalPartners::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ExternalPartners::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ExternalPartners::Name).string().not_null())
                        .col(
                            ColumnDef::new(ExternalPartners::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(ExternalPartners::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ExternalPartners::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ExternalMoves::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(ExternalMoves::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(ExternalMoves::WorkOrderId).uuid().not_null())
                        .col(ColumnDef::new(ExternalMoves::PartnerId).uuid())
                        .col(ColumnDef::new(ExternalMoves::Process).string().not_null())
                        .col(
                            ColumnDef::new(ExternalMoves::QuantitySent)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ExternalMoves::QuantityReturned)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ExternalMoves::QuantityRejected)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ExternalMoves::SentDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ExternalMoves::ExpectedReturnDate)
                                .timestamp_with_time_zone(),
                        )
                        .col(
                            ColumnDef::new(ExternalMoves::ActualReturnDate)
                                .timestamp_with_time_zone(),
                        )
                        .col(ColumnDef::new(ExternalMoves::Status).string().not_null())
                        .col(
                            ColumnDef::new(ExternalMoves::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ExternalMoves::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_external_moves_partner")
                                .from(ExternalMoves::Table, ExternalMoves::PartnerId)
                                .to(ExternalPartners::Table, ExternalPartners::Id),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ExternalMoves::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ExternalPartners::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum ExternalPartners {
        Table,
        Id,
        Name,
        Active,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub enum ExternalMoves {
        Table,
        Id,
        WorkOrderId,
        PartnerId,
        Process,
        QuantitySent,
        QuantityReturned,
        QuantityRejected,
        SentDate,
        ExpectedReturnDate,
        ActualReturnDate,
        Status,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000005_create_cartons_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000005_create_cartons_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Cartons::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Cartons::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Cartons::WorkOrderId).uuid().not_null())
                        .col(ColumnDef::new(Cartons::Quantity).integer().not_null().default(0))
                        .col(
                            ColumnDef::new(Cartons::DispatchedQty)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Cartons::Status).string().not_null())
                        .col(
                            ColumnDef::new(Cartons::BuiltAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Cartons::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Cartons::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Cartons::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum Cartons {
        Table,
        Id,
        WorkOrderId,
        Quantity,
        DispatchedQty,
        Status,
        BuiltAt,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000006_create_production_logs_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000006_create_production_logs_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ProductionLogs::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductionLogs::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductionLogs::BatchId).uuid().not_null())
                        .col(ColumnDef::new(ProductionLogs::WorkOrderId).uuid().not_null())
                        .col(
                            ColumnDef::new(ProductionLogs::Quantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ProductionLogs::RejectedQty)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ProductionLogs::LoggedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductionLogs::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_production_logs_batch_logged")
                        .table(ProductionLogs::Table)
                        .col(ProductionLogs::BatchId)
                        .col(ProductionLogs::LoggedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ProductionLogs::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum ProductionLogs {
        Table,
        Id,
        BatchId,
        WorkOrderId,
        Quantity,
        RejectedQty,
        LoggedAt,
        CreatedAt,
    }
}

mod m20240301_000007_create_instruments_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000007_create_instruments_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Instruments::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Instruments::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Instruments::Name).string().not_null())
                        .col(ColumnDef::new(Instruments::SerialNumber).string())
                        .col(ColumnDef::new(Instruments::CalibrationDue).date().not_null())
                        .col(
                            ColumnDef::new(Instruments::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Instruments::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Instruments::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum Instruments {
        Table,
        Id,
        Name,
        SerialNumber,
        CalibrationDue,
        CreatedAt,
        UpdatedAt,
    }
}
