//! Arrow schemas and batch conversion for each table

use super::types::{ArtistDimension, SongDimension, SongplayFact, TimeDimension, UserDimension};
use crate::error::Result;
use crate::types::TableName;
use arrow::array::{ArrayRef, Float64Array, Int32Array, Int64Array, StringArray, TimestampSecondArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use arrow::record_batch::RecordBatch;
use std::sync::Arc;

/// Timezone tag for every timestamp column
pub const UTC: &str = "UTC";

/// A table of the star schema
pub trait Table: Sized {
    /// Table name (also its directory under the output root)
    const NAME: TableName;

    /// Hive partition columns, outermost first
    const PARTITION_COLUMNS: &'static [&'static str];

    /// Full Arrow schema, partition columns included
    fn schema() -> SchemaRef;

    /// Convert rows into a single batch matching [`Table::schema`]
    fn to_batch(rows: &[Self]) -> Result<RecordBatch>;
}

fn timestamp_type() -> DataType {
    DataType::Timestamp(TimeUnit::Second, Some(UTC.into()))
}

fn strings<'a, T>(rows: &'a [T], f: impl Fn(&'a T) -> Option<&'a str>) -> ArrayRef {
    Arc::new(rows.iter().map(f).collect::<StringArray>())
}

fn int32s<T>(rows: &[T], f: impl Fn(&T) -> Option<i32>) -> ArrayRef {
    Arc::new(rows.iter().map(f).collect::<Int32Array>())
}

fn int64s<T>(rows: &[T], f: impl Fn(&T) -> Option<i64>) -> ArrayRef {
    Arc::new(rows.iter().map(f).collect::<Int64Array>())
}

fn float64s<T>(rows: &[T], f: impl Fn(&T) -> Option<f64>) -> ArrayRef {
    Arc::new(rows.iter().map(f).collect::<Float64Array>())
}

fn timestamps<T>(rows: &[T], f: impl Fn(&T) -> i64) -> ArrayRef {
    let values: Vec<i64> = rows.iter().map(f).collect();
    Arc::new(TimestampSecondArray::from(values).with_timezone(UTC))
}

impl Table for SongDimension {
    const NAME: TableName = TableName::Song;
    const PARTITION_COLUMNS: &'static [&'static str] = &["year", "artist_id"];

    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("song_id", DataType::Utf8, false),
            Field::new("title", DataType::Utf8, true),
            Field::new("artist_id", DataType::Utf8, true),
            Field::new("year", DataType::Int32, true),
            Field::new("duration", DataType::Float64, true),
        ]))
    }

    fn to_batch(rows: &[Self]) -> Result<RecordBatch> {
        let columns = vec![
            strings(rows, |r| Some(r.song_id.as_str())),
            strings(rows, |r| r.title.as_deref()),
            strings(rows, |r| r.artist_id.as_deref()),
            int32s(rows, |r| r.year),
            float64s(rows, |r| r.duration),
        ];
        Ok(RecordBatch::try_new(Self::schema(), columns)?)
    }
}

impl Table for ArtistDimension {
    const NAME: TableName = TableName::Artist;
    const PARTITION_COLUMNS: &'static [&'static str] = &[];

    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("artist_id", DataType::Utf8, false),
            Field::new("name", DataType::Utf8, true),
            Field::new("location", DataType::Utf8, true),
            Field::new("latitude", DataType::Float64, true),
            Field::new("longitude", DataType::Float64, true),
        ]))
    }

    fn to_batch(rows: &[Self]) -> Result<RecordBatch> {
        let columns = vec![
            strings(rows, |r| Some(r.artist_id.as_str())),
            strings(rows, |r| r.name.as_deref()),
            strings(rows, |r| r.location.as_deref()),
            float64s(rows, |r| r.latitude),
            float64s(rows, |r| r.longitude),
        ];
        Ok(RecordBatch::try_new(Self::schema(), columns)?)
    }
}

impl Table for UserDimension {
    const NAME: TableName = TableName::User;
    const PARTITION_COLUMNS: &'static [&'static str] = &[];

    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("user_id", DataType::Utf8, false),
            Field::new("first_name", DataType::Utf8, true),
            Field::new("last_name", DataType::Utf8, true),
            Field::new("gender", DataType::Utf8, true),
            Field::new("level", DataType::Utf8, true),
        ]))
    }

    fn to_batch(rows: &[Self]) -> Result<RecordBatch> {
        let columns = vec![
            strings(rows, |r| Some(r.user_id.as_str())),
            strings(rows, |r| r.first_name.as_deref()),
            strings(rows, |r| r.last_name.as_deref()),
            strings(rows, |r| r.gender.as_deref()),
            strings(rows, |r| r.level.as_deref()),
        ];
        Ok(RecordBatch::try_new(Self::schema(), columns)?)
    }
}

impl Table for TimeDimension {
    const NAME: TableName = TableName::Time;
    const PARTITION_COLUMNS: &'static [&'static str] = &["year", "month"];

    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("start_time", timestamp_type(), false),
            Field::new("hour", DataType::Int32, false),
            Field::new("day", DataType::Int32, false),
            Field::new("week", DataType::Int32, false),
            Field::new("month", DataType::Int32, false),
            Field::new("year", DataType::Int32, false),
            Field::new("weekday", DataType::Utf8, false),
        ]))
    }

    fn to_batch(rows: &[Self]) -> Result<RecordBatch> {
        let columns = vec![
            timestamps(rows, |r| r.start_time),
            int32s(rows, |r| Some(r.hour)),
            int32s(rows, |r| Some(r.day)),
            int32s(rows, |r| Some(r.week)),
            int32s(rows, |r| Some(r.month)),
            int32s(rows, |r| Some(r.year)),
            strings(rows, |r| Some(r.weekday.as_str())),
        ];
        Ok(RecordBatch::try_new(Self::schema(), columns)?)
    }
}

impl Table for SongplayFact {
    const NAME: TableName = TableName::Songplay;
    const PARTITION_COLUMNS: &'static [&'static str] = &["year", "month"];

    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("songplay_id", DataType::Int64, false),
            Field::new("start_time", timestamp_type(), false),
            Field::new("user_id", DataType::Utf8, true),
            Field::new("level", DataType::Utf8, true),
            Field::new("song_id", DataType::Utf8, true),
            Field::new("artist_id", DataType::Utf8, true),
            Field::new("session_id", DataType::Int64, true),
            Field::new("location", DataType::Utf8, true),
            Field::new("user_agent", DataType::Utf8, true),
            Field::new("year", DataType::Int32, false),
            Field::new("month", DataType::Int32, false),
        ]))
    }

    fn to_batch(rows: &[Self]) -> Result<RecordBatch> {
        let columns = vec![
            int64s(rows, |r| Some(r.songplay_id)),
            timestamps(rows, |r| r.start_time),
            strings(rows, |r| r.user_id.as_deref()),
            strings(rows, |r| r.level.as_deref()),
            strings(rows, |r| r.song_id.as_deref()),
            strings(rows, |r| r.artist_id.as_deref()),
            int64s(rows, |r| r.session_id),
            strings(rows, |r| r.location.as_deref()),
            strings(rows, |r| r.user_agent.as_deref()),
            int32s(rows, |r| Some(r.year)),
            int32s(rows, |r| Some(r.month)),
        ];
        Ok(RecordBatch::try_new(Self::schema(), columns)?)
    }
}
