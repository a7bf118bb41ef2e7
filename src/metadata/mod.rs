//! Public API: one façade per object class. Façades validate their input
//! locally and then delegate to a provider; nothing invalid reaches a backend.

use crate::dao::ObjectKey;
use crate::error::{ErrorCode, Result};
use crate::model::ObjectId;

mod constraints;
mod datatypes;
mod indexes;
mod roles;
mod statistics;
mod tables;

pub use constraints::Constraints;
pub use datatypes::DataTypes;
pub use indexes::Indexes;
pub use roles::Roles;
pub use statistics::Statistics;
pub use tables::Tables;

/// Key for an id argument; ids below 1 are never assigned.
pub(crate) fn id_key(id: ObjectId) -> Result<ObjectKey<'static>> {
    if id <= 0 {
        Err(ErrorCode::IdNotFound)
    } else {
        Ok(ObjectKey::Id(id))
    }
}

pub(crate) fn name_key(name: &str) -> Result<ObjectKey<'_>> {
    if name.is_empty() {
        Err(ErrorCode::NameNotFound)
    } else {
        Ok(ObjectKey::Name(name))
    }
}

/// Accepts an `Id` or `Name` key given by the caller, applying the same
/// checks as [`id_key`] and [`name_key`].
pub(crate) fn id_or_name_key(key: ObjectKey<'_>) -> Result<ObjectKey<'_>> {
    match key {
        ObjectKey::Id(id) => id_key(id),
        ObjectKey::Name(name) => name_key(name),
        _ => Err(ErrorCode::InvalidParameter),
    }
}

/// A positive id, or `InvalidParameter`.
pub(crate) fn positive(value: Option<i64>) -> Result<i64> {
    value
        .filter(|v| *v > 0)
        .ok_or(ErrorCode::InvalidParameter)
}

/// Backend-agnostic behaviour every session implementation must show.
#[cfg(test)]
pub mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::{Constraints, DataTypes, Indexes, Roles, Statistics, Tables};
    use crate::dao::{DbSessionManager, ObjectClass, ObjectKey};
    use crate::error::ErrorCode;
    use crate::model::{
        ColumnStatistic, Constraint, ConstraintType, Index, Table, TableStatistic,
    };

    const INT4: i64 = 23;
    const VARCHAR: i64 = 1043;

    fn sample_table(name: &str) -> Table {
        let mut table = Table::new(name);
        table.namespace = Some("public".to_string());
        table.primary_key = vec![1];
        table.tuples = Some(42.0);
        table.acl = vec!["=r/admin".to_string(), "writer=arwd/admin".to_string()];
        table.columns = vec![
            crate::model::Column::new("c1", 1, INT4, false),
            crate::model::Column {
                default_expr: Some("'none'".to_string()),
                ..crate::model::Column::new("c2", 2, VARCHAR, true)
            },
        ];
        table.constraints = vec![Constraint::new(ConstraintType::PrimaryKey, vec![1])];
        table
    }

    pub async fn run_generic_metadata_tests(session: Arc<dyn DbSessionManager>) {
        let tables = Tables::new(session.clone());
        tables.init().await.unwrap();

        // Add a table and read it back by id and by name
        let table = sample_table("t1");
        let table_id = tables.add(&table).await.unwrap();
        assert!(table_id > 0);

        let loaded = tables.get(table_id).await.unwrap();
        assert_eq!(loaded.id, Some(table_id));
        assert_eq!(loaded.name, "t1");
        assert_eq!(loaded.namespace.as_deref(), Some("public"));
        assert_eq!(loaded.primary_key, vec![1]);
        assert_eq!(loaded.tuples, None);
        assert_eq!(loaded.acl, table.acl);
        assert_eq!(loaded.columns.len(), 2);
        assert_eq!(loaded.columns[0].name, "c1");
        assert_eq!(loaded.columns[0].data_type_id, Some(INT4));
        assert_eq!(loaded.columns[0].nullable, Some(false));
        assert_eq!(loaded.columns[0].table_id, Some(table_id));
        assert_eq!(loaded.columns[1].default_expr.as_deref(), Some("'none'"));
        assert_eq!(loaded.constraints.len(), 1);
        assert_eq!(loaded.constraints[0].table_id, Some(table_id));

        let by_name = tables.get_by_name("t1").await.unwrap();
        assert_eq!(by_name, loaded);

        // Names are unique per class
        assert_eq!(
            tables.add(&sample_table("t1")).await.unwrap_err(),
            ErrorCode::TableNameAlreadyExists
        );

        // Lookups that cannot match
        assert_eq!(tables.get(0).await.unwrap_err(), ErrorCode::IdNotFound);
        assert_eq!(
            tables.get_by_name("nonexistent_name").await.unwrap_err(),
            ErrorCode::NameNotFound
        );
        assert_eq!(
            tables.get(table_id + 1000).await.unwrap_err(),
            ErrorCode::IdNotFound
        );

        // Validation happens before anything is stored
        let mut invalid = sample_table("t_invalid");
        invalid.columns[1].data_type_id = Some(999_999);
        assert_eq!(
            tables.add(&invalid).await.unwrap_err(),
            ErrorCode::InvalidParameter
        );
        let mut invalid = sample_table("t_invalid");
        invalid.columns[1].ordinal_position = Some(1);
        assert_eq!(
            tables.add(&invalid).await.unwrap_err(),
            ErrorCode::InvalidParameter
        );
        assert_eq!(
            tables.get_by_name("t_invalid").await.unwrap_err(),
            ErrorCode::NameNotFound
        );

        // Table statistics update only the row count
        let updated = tables
            .set_statistic(&TableStatistic {
                id: Some(table_id),
                tuples: Some(1024.5),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(updated, table_id);
        let statistic = tables.get_statistic_by_name("t1").await.unwrap();
        assert_eq!(statistic.id, Some(table_id));
        assert_eq!(statistic.tuples, Some(1024.5));
        let reloaded = tables.get(table_id).await.unwrap();
        assert_eq!(reloaded.tuples, Some(1024.5));
        assert_eq!(reloaded.columns, loaded.columns);

        // Column statistics
        let statistics = Statistics::new(session.clone());
        statistics.init().await.unwrap();
        let histogram = json!({"histogram": [1, 2, 3]});
        let statistic_id = statistics
            .add(&ColumnStatistic {
                name: Some("c1_stats".to_string()),
                table_id: Some(table_id),
                ordinal_position: Some(1),
                column_statistic: Some(histogram.clone()),
                ..Default::default()
            })
            .await
            .unwrap();

        let by_number = statistics
            .get_by_column_number(table_id, 1)
            .await
            .unwrap();
        assert_eq!(by_number.id, Some(statistic_id));
        assert_eq!(by_number.column_name.as_deref(), Some("c1"));
        assert_eq!(by_number.column_statistic, Some(histogram));
        let column_id = by_number.column_id.unwrap();

        // A second statistic for the same column replaces the first
        let replaced = statistics
            .add(&ColumnStatistic {
                column_id: Some(column_id),
                column_statistic: Some(json!({"histogram": []})),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(replaced, statistic_id);
        assert_eq!(statistics.get_all_by_table_id(table_id).await.unwrap().len(), 1);

        assert_eq!(
            statistics
                .add(&ColumnStatistic {
                    table_id: Some(table_id),
                    column_name: Some("missing".to_string()),
                    ..Default::default()
                })
                .await
                .unwrap_err(),
            ErrorCode::NotFound
        );
        assert_eq!(
            statistics
                .get_by_column_number(table_id, 0)
                .await
                .unwrap_err(),
            ErrorCode::InvalidParameter
        );

        // Data types are seeded
        let datatypes = DataTypes::new(session.clone());
        datatypes.init().await.unwrap();
        assert_eq!(datatypes.get(INT4).await.unwrap().name, "INT32");
        assert_eq!(datatypes.get_by_name("INT64").await.unwrap().id, 20);
        assert_eq!(
            datatypes
                .get_by_qualified_name("float8")
                .await
                .unwrap()
                .name,
            "FLOAT64"
        );
        assert_eq!(datatypes.get_all().await.unwrap().len(), 13);
        assert_eq!(
            datatypes.get_by_name("nonexistent_name").await.unwrap_err(),
            ErrorCode::NameNotFound
        );

        // Roles never exist under this name
        let roles = Roles::new(session.clone());
        roles.init().await.unwrap();
        assert_eq!(
            roles.get_by_name("nonexistent_name").await.unwrap_err(),
            ErrorCode::NameNotFound
        );
        assert_eq!(roles.get(0).await.unwrap_err(), ErrorCode::IdNotFound);

        // Indexes
        let indexes = Indexes::new(session.clone());
        indexes.init().await.unwrap();
        let index_id = indexes
            .add(&Index {
                name: "t1_c1".to_string(),
                table_id: Some(table_id),
                keys: vec![1],
                is_unique: true,
                ..Default::default()
            })
            .await
            .unwrap();
        let index = indexes.get_by_name("t1_c1").await.unwrap();
        assert_eq!(index.id, Some(index_id));
        assert!(index.is_unique);
        assert_eq!(
            indexes
                .add(&Index {
                    name: "t1_c1".to_string(),
                    table_id: Some(table_id),
                    ..Default::default()
                })
                .await
                .unwrap_err(),
            ErrorCode::AlreadyExists
        );
        assert_eq!(indexes.remove(index_id).await.unwrap(), index_id);
        assert_eq!(indexes.get(index_id).await.unwrap_err(), ErrorCode::IdNotFound);

        // Standalone constraints
        let constraints = Constraints::new(session.clone());
        constraints.init().await.unwrap();
        let constraint_id = constraints
            .add(&Constraint {
                table_id: Some(table_id),
                ..Constraint::new(ConstraintType::Unique, vec![2])
            })
            .await
            .unwrap();
        assert_eq!(
            constraints.get(constraint_id).await.unwrap().columns,
            vec![2]
        );
        assert_eq!(tables.get(table_id).await.unwrap().constraints.len(), 2);
        assert_eq!(constraints.remove(constraint_id).await.unwrap(), constraint_id);
        assert_eq!(
            constraints.get(constraint_id).await.unwrap_err(),
            ErrorCode::IdNotFound
        );

        // Removal takes the children along
        let other_id = tables.add(&sample_table("t2")).await.unwrap();
        assert!(other_id > table_id);
        assert_eq!(tables.get_all().await.unwrap().len(), 2);
        assert_eq!(tables.remove(table_id).await.unwrap(), table_id);
        assert_eq!(tables.get(table_id).await.unwrap_err(), ErrorCode::IdNotFound);
        assert_eq!(
            statistics.get(statistic_id).await.unwrap_err(),
            ErrorCode::IdNotFound
        );
        assert_eq!(tables.remove_by_name("t2").await.unwrap(), other_id);
        assert!(tables.get_all().await.unwrap().is_empty());

        // Re-adding a removed name is allowed and gets a fresh id
        let readded = tables.add(&sample_table("t1")).await.unwrap();
        assert!(readded > other_id);
        tables.remove(readded).await.unwrap();

        // Ids keep increasing per class
        let ids = session.object_id_generator().await.unwrap();
        let current = ids.current(ObjectClass::Tables).await.unwrap();
        assert!(current >= readded);
        assert!(ids.generate(ObjectClass::Tables).await.unwrap() > current);

        // Preparing a cached DAO again is harmless
        session.tables_dao().await.unwrap().prepare().await.unwrap();
        assert_eq!(
            session
                .tables_dao()
                .await
                .unwrap()
                .select_table(ObjectKey::TableId(1))
                .await
                .unwrap_err(),
            ErrorCode::InvalidParameter
        );
    }
}
