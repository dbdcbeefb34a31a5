use bbox_overlay::core_modules::bbox_text::parse_bbox;
use bbox_overlay::{BoundingBox, Dimensions, project_box};
use proptest::prelude::*;

fn coord() -> impl Strategy<Value = f64> {
    (0u32..4000).prop_map(f64::from)
}

fn side() -> impl Strategy<Value = f64> {
    (1u32..4000).prop_map(f64::from)
}

proptest! {
    #[test]
    fn ordered_boxes_scale_per_axis(
        l in coord(), t in coord(), w in coord(), h in coord(),
        nw in side(), nh in side(), dw in side(), dh in side(),
    ) {
        let bbox = BoundingBox::new(l, t, l + w, t + h);
        let rect = project_box(Dimensions::new(nw, nh), Dimensions::new(dw, dh), bbox).unwrap();
        let (sx, sy) = (dw / nw, dh / nh);

        prop_assert!((rect.x - l * sx).abs() < 1e-6);
        prop_assert!((rect.y - t * sy).abs() < 1e-6);
        prop_assert!((rect.width - w * sx).abs() < 1e-6);
        prop_assert!((rect.height - h * sy).abs() < 1e-6);
    }

    #[test]
    fn drawn_size_is_never_negative(
        a in coord(), b in coord(), c in coord(), d in coord(),
        nw in side(), nh in side(), dw in side(), dh in side(),
    ) {
        let natural = Dimensions::new(nw, nh);
        let displayed = Dimensions::new(dw, dh);
        let rect = project_box(natural, displayed, BoundingBox::new(a, b, c, d)).unwrap();
        prop_assert!(rect.width >= 0.0);
        prop_assert!(rect.height >= 0.0);

        // Coordinate order does not change the drawn region.
        let swapped = project_box(natural, displayed, BoundingBox::new(c, d, a, b)).unwrap();
        prop_assert_eq!(rect, swapped);
    }

    #[test]
    fn fewer_than_four_fields_never_parse(fields in prop::collection::vec(0u32..1000, 0..4)) {
        let text = fields.iter().map(u32::to_string).collect::<Vec<_>>().join(",");
        prop_assert!(parse_bbox(&text).is_err());
    }
}
