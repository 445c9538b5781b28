//! Table schema tests

use super::*;
use arrow::array::{Array, StringArray, TimestampSecondArray};
use arrow::datatypes::{DataType, TimeUnit};

fn song(id: &str, year: Option<i32>) -> SongDimension {
    SongDimension {
        song_id: id.to_string(),
        title: Some(format!("title {id}")),
        artist_id: Some("AR1".to_string()),
        year,
        duration: Some(180.0),
    }
}

#[test]
fn test_partition_columns_exist_in_schema() {
    fn check<T: Table>() {
        let schema = T::schema();
        for column in T::PARTITION_COLUMNS {
            assert!(
                schema.field_with_name(column).is_ok(),
                "{} lacks partition column {column}",
                T::NAME
            );
        }
    }

    check::<SongDimension>();
    check::<ArtistDimension>();
    check::<UserDimension>();
    check::<TimeDimension>();
    check::<SongplayFact>();
}

#[test]
fn test_song_batch() {
    let rows = vec![song("S1", Some(2001)), song("S2", None)];
    let batch = SongDimension::to_batch(&rows).unwrap();

    assert_eq!(batch.num_rows(), 2);
    assert_eq!(batch.num_columns(), 5);

    let ids = batch
        .column(0)
        .as_any()
        .downcast_ref::<StringArray>()
        .unwrap();
    assert_eq!(ids.value(1), "S2");
    assert!(batch.column(3).is_null(1));
}

#[test]
fn test_empty_batch() {
    let batch = UserDimension::to_batch(&[]).unwrap();
    assert_eq!(batch.num_rows(), 0);
    assert_eq!(batch.schema(), UserDimension::schema());
}

#[test]
fn test_time_batch_timestamp_column() {
    let rows = vec![TimeDimension {
        start_time: 1_541_121_934,
        hour: 1,
        day: 2,
        week: 44,
        month: 11,
        year: 2018,
        weekday: "Friday".to_string(),
    }];
    let batch = TimeDimension::to_batch(&rows).unwrap();

    assert_eq!(
        batch.schema().field(0).data_type(),
        &DataType::Timestamp(TimeUnit::Second, Some(UTC.into()))
    );
    let ts = batch
        .column(0)
        .as_any()
        .downcast_ref::<TimestampSecondArray>()
        .unwrap();
    assert_eq!(ts.value(0), 1_541_121_934);
}

#[test]
fn test_songplay_batch_nullable_keys() {
    let rows = vec![SongplayFact {
        songplay_id: 7,
        start_time: 1_541_121_934,
        user_id: Some("26".to_string()),
        level: Some("free".to_string()),
        song_id: None,
        artist_id: None,
        session_id: Some(583),
        location: None,
        user_agent: None,
        year: 2018,
        month: 11,
    }];
    let batch = SongplayFact::to_batch(&rows).unwrap();

    assert_eq!(batch.num_rows(), 1);
    assert!(batch.column(4).is_null(0));
    assert!(batch.column(5).is_null(0));
}
