use std::io::Write;

use crate::dataset::{Dataset, DatasetRow, InteractionType, NO_VIDEO_AVAILABLE};
use crate::error::RecommendError;

const CSV: &str = "\
user_id,username,post_id,title,view_count,average_rating,upvote_count,interaction_type,video_link,category_id,category_description,mood
1.0,alice,10.0,Cats and dogs,120,4.5,7,liked,https://v/10,3,Pets,happy
1,alice,20,Dogs only,,,,Viewed,,3.0,Pets,
2,bob,10,,,nan,,rated,https://v/10-other,,,sad
,ghost,30,Cars,,,,liked,,,,
2,bob,30,Cars,5,,,inspired,,7,Vehicles,
";

#[test]
fn test_load_from_reader() {
    crate::tests::init();
    let ds = Dataset::from_reader(CSV.as_bytes()).unwrap();
    assert_eq!(ds.len(), 5);
    assert!(ds.has_mood());
    assert_eq!(ds.load_report().malformed_rows, 0);

    let first = &ds.rows()[0];
    assert_eq!(first.user_id, Some(1));
    assert_eq!(first.post_id, Some(10));
    assert_eq!(first.interaction_type, Some(InteractionType::Liked));
    assert_eq!(first.average_rating, Some(4.5));

    // missing user id survives loading and is dropped by the matrix builder
    assert_eq!(ds.rows()[3].user_id, None);
    assert_eq!(ds.rows()[1].interaction_type, Some(InteractionType::Viewed));
    assert_eq!(ds.rows()[2].average_rating, None);
}

#[test]
fn test_post_metadata_takes_first_non_null() {
    let ds = Dataset::from_reader(CSV.as_bytes()).unwrap();

    let p10 = ds.post(10).unwrap();
    assert_eq!(p10.title.as_deref(), Some("Cats and dogs"));
    assert_eq!(p10.video_link.as_deref(), Some("https://v/10"));
    assert_eq!(p10.category_id, Some(3));
    assert_eq!(p10.mood.as_deref(), Some("happy"));
    assert_eq!(p10.view_count, Some(120));

    let p20 = ds.post(20).unwrap();
    assert_eq!(p20.category_id, Some(3));
    assert_eq!(p20.link_or_sentinel(), NO_VIDEO_AVAILABLE);

    // first row for 30 has no category, the second one does
    let p30 = ds.post(30).unwrap();
    assert_eq!(p30.category_id, Some(7));
    assert_eq!(p30.view_count, Some(5));

    let titles: Vec<(u64, &str)> = ds.titles().collect();
    assert_eq!(titles, vec![(10, "Cats and dogs"), (20, "Dogs only"), (30, "Cars")]);
}

#[test]
fn test_username_lookup() {
    let ds = Dataset::from_reader(CSV.as_bytes()).unwrap();
    assert_eq!(ds.user_id_for("alice"), Some(1));
    assert_eq!(ds.user_id_for("bob"), Some(2));
    // no user id on its only row
    assert_eq!(ds.user_id_for("ghost"), None);
    assert_eq!(ds.user_id_for("nobody"), None);
}

#[test]
fn test_first_username_row_wins() {
    let rows = vec![
        DatasetRow::interaction(7, 1, InteractionType::Liked).with_username("sam"),
        DatasetRow::interaction(8, 1, InteractionType::Liked).with_username("sam"),
    ];
    assert_eq!(Dataset::from_rows(rows).user_id_for("sam"), Some(7));
}

#[test]
fn test_missing_mood_column() {
    let csv = "user_id,username,post_id,title,interaction_type\n1,alice,10,Cats,liked\n";
    let ds = Dataset::from_reader(csv.as_bytes()).unwrap();
    assert!(!ds.has_mood());
    assert_eq!(ds.post(10).unwrap().mood, None);
}

#[test]
fn test_capitalised_mood_header() {
    let csv = "user_id,post_id,interaction_type,Mood\n1,10,liked,Calm\n";
    let ds = Dataset::from_reader(csv.as_bytes()).unwrap();
    assert!(ds.has_mood());
    assert_eq!(ds.post(10).unwrap().mood.as_deref(), Some("Calm"));
}

#[test]
fn test_malformed_rows_are_counted() {
    crate::tests::init();
    let csv = "user_id,post_id,interaction_type\n1,10,liked\n2,20\n3,30,viewed,extra\n4,40,rated\n";
    let ds = Dataset::from_reader(csv.as_bytes()).unwrap();
    assert_eq!(ds.len(), 2);
    assert_eq!(ds.load_report().rows_read, 4);
    assert_eq!(ds.load_report().malformed_rows, 2);
}

#[test]
fn test_unparsable_fields_become_none() {
    let csv = "user_id,post_id,interaction_type,category_id\nabc,10,shared,1.5\n";
    let ds = Dataset::from_reader(csv.as_bytes()).unwrap();
    let row = &ds.rows()[0];
    assert_eq!(row.user_id, None);
    assert_eq!(row.post_id, Some(10));
    assert_eq!(row.interaction_type, None);
    assert_eq!(row.category_id, None);
}

#[test]
fn test_load_csv_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(CSV.as_bytes()).unwrap();
    let ds = Dataset::load_csv(file.path()).unwrap();
    assert_eq!(ds.len(), 5);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Dataset::load_csv(&dir.path().join("absent.csv")).unwrap_err();
    assert!(matches!(err, RecommendError::Io { .. }));
}

#[test]
fn test_interaction_type_parsing() {
    assert_eq!("LIKED".parse::<InteractionType>(), Ok(InteractionType::Liked));
    assert_eq!(" rated ".parse::<InteractionType>(), Ok(InteractionType::Rated));
    assert!("shared".parse::<InteractionType>().is_err());
    assert_eq!(InteractionType::Inspired.to_string(), "inspired");
}
