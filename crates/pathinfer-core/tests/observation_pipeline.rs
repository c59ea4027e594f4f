use pathinfer_core::{EvidenceVector, RecordError, SliceScheduler, parse_records};

const ORDER: [&str; 6] = ["LocA", "LocB", "LocC", "LocD", "LocE", "LocF"];

#[test]
fn observations_become_boundary_evidence() {
    let raw = "KA-01;LocA:0.7,LocB:0.3;2012-05-14 10:00:00.250!;2012-05-14 10:00:05!#\
KA-01;LocF:0.4,LocE:0.6,Depot:1.0;2012/05/14 10:02:00;2012/05/14 10:02:05";
    let (first, second) = parse_records(raw).expect("valid records");

    assert_eq!(first.license_plate(), "KA-01");
    assert_eq!(first.start_time_epoch(), 1_336_989_600);
    assert_eq!(second.start_time_epoch() - first.end_time_epoch(), 115);

    let plan = SliceScheduler::new(30).plan(&first, &second);
    assert_eq!((plan.slices, plan.last_slice()), (3, 2));

    let e0 = EvidenceVector::from_record(&first, &ORDER[..]);
    let e1 = EvidenceVector::from_record(&second, &ORDER[..]);
    assert_eq!(e0.as_slice(), &[0.7, 0.3, 0.0, 0.0, 0.0, 0.0]);
    // Locations the model does not know are ignored.
    assert_eq!(e1.as_slice(), &[0.0, 0.0, 0.0, 0.0, 0.6, 0.4]);
}

#[test]
fn wide_interval_drops_the_gap_slice() {
    let raw = "P;LocA:1;2012-05-14 10:00:00;2012-05-14 10:00:05#P;LocB:1;2012-05-14 10:00:20;2012-05-14 10:00:25";
    let (first, second) = parse_records(raw).expect("valid records");
    let plan = SliceScheduler::new(15).plan(&first, &second);
    assert_eq!(plan.slices, 2);
    assert!(!plan.gap_slice);
}

#[test]
fn malformed_inputs_are_rejected() {
    assert!(matches!(
        parse_records("only;one;record;here"),
        Err(RecordError::RecordCount { found: 1 })
    ));
    assert!(matches!(
        parse_records("P;LocA:1;2012-05-14 10:00:00#P;LocB:1;2012-05-14 10:00:20;2012-05-14 10:00:25"),
        Err(RecordError::FieldCount { record: 0, found: 3 })
    ));
    assert!(matches!(
        parse_records("P;LocA:x;2012-05-14 10:00:00;2012-05-14 10:00:05#P;LocB:1;2012-05-14 10:00:20;2012-05-14 10:00:25"),
        Err(RecordError::Probability { .. })
    ));
    assert!(matches!(
        parse_records("P;LocA:1;yesterday;2012-05-14 10:00:05#P;LocB:1;2012-05-14 10:00:20;2012-05-14 10:00:25"),
        Err(RecordError::Timestamp(_))
    ));
}
