//! Piece catalogue tests

use std::collections::HashSet;

use tetrecs::core::{rotate_cw, Piece};
use tetrecs::types::PIECE_COUNT;

#[test]
fn test_catalogue_has_fifteen_named_shapes() {
    let names: Vec<_> = (0..PIECE_COUNT)
        .map(|id| Piece::new(id).unwrap().name())
        .collect();
    assert_eq!(
        names,
        vec![
            "Line",
            "C",
            "Plus",
            "Dot",
            "Square",
            "L",
            "J",
            "S",
            "Z",
            "T",
            "X",
            "Corner",
            "Inverse Corner",
            "Double",
            "Triple"
        ]
    );
    assert!(Piece::new(PIECE_COUNT).is_none());
}

#[test]
fn test_value_is_id_plus_one() {
    for id in 0..PIECE_COUNT {
        assert_eq!(Piece::new(id).unwrap().value(), id as i32 + 1);
    }
}

#[test]
fn test_block_counts() {
    let counts: Vec<_> = (0..PIECE_COUNT)
        .map(|id| Piece::new(id).unwrap().block_count())
        .collect();
    assert_eq!(counts, vec![3, 5, 5, 1, 4, 4, 4, 4, 4, 4, 5, 3, 3, 2, 3]);
}

#[test]
fn test_four_rotations_are_identity() {
    for id in 0..PIECE_COUNT {
        let p = Piece::new(id).unwrap();
        assert_eq!(p.rotated(4), p);
        assert_eq!(p.rotated(1).rotated(3), p);
        let mut q = p;
        q.rotate(2);
        assert_eq!(q, p.rotated(2));
    }
}

#[test]
fn test_rotation_preserves_block_count() {
    for id in 0..PIECE_COUNT {
        let p = Piece::new(id).unwrap();
        for turns in 0..4 {
            assert_eq!(p.rotated(turns).block_count(), p.block_count());
            assert_eq!(p.rotated(turns).id(), id);
        }
    }
}

#[test]
fn test_rotate_cw_mask() {
    let t = *Piece::new(9).unwrap().mask();
    assert_eq!(rotate_cw(&t), [[0, 0, 1], [0, 1, 1], [0, 0, 1]]);
}

#[test]
fn test_symmetric_shapes() {
    let orientations = |id: u8| -> usize {
        let p = Piece::new(id).unwrap();
        (0..4).map(|t| *p.rotated(t).mask()).collect::<HashSet<_>>().len()
    };
    assert_eq!(orientations(2), 1); // Plus
    assert_eq!(orientations(3), 1); // Dot
    assert_eq!(orientations(10), 1); // X
    assert_eq!(orientations(0), 2); // Line
    assert_eq!(orientations(9), 4); // T
}
