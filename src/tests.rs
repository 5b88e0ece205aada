#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::num::NonZero;

    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use unordered_pair::UnorderedPair;

    use crate::affiliation::default_display;
    use crate::board::Direction;
    use crate::builder::{BuildError, Builder, BuilderInvalidReason, SquareBoardBuilder};
    use crate::location::Location;
    use crate::shape::SquareStep;
    use crate::{Board, CellDescriptor, InvalidGraph, SolverFailure, SolverOptions};

    fn aff(id: usize) -> NonZero<usize> {
        NonZero::new(id).unwrap()
    }

    fn dims(x: usize, y: usize) -> (NonZero<usize>, NonZero<usize>) {
        (NonZero::new(x).unwrap(), NonZero::new(y).unwrap())
    }

    /// `n` cells in a row, each adjacent only to the ones beside it, with termini of color 1 at both ends.
    fn line(n: usize) -> Board {
        Board::new((0..n)
            .map(|i| {
                let neighbors = [i.checked_sub(1), Some(i + 1).filter(|j| *j < n)]
                    .into_iter()
                    .flatten()
                    .collect();
                let location = Location(i, 0);
                if i == 0 || i == n - 1 {
                    CellDescriptor::terminus(aff(1), location, neighbors)
                } else {
                    CellDescriptor::path(location, neighbors)
                }
            })
            .collect())
            .unwrap()
    }

    /// Every cell lies on exactly one flow, and every flow is a simple path from its source to its sink.
    fn assert_covered(board: &Board) {
        assert!(board.is_solved());

        let mut seen = HashSet::new();
        for path in board.paths() {
            assert!(path.is_complete(board), "{path:?} stops short of its sink");
            for id in &path.cells {
                assert!(seen.insert(*id), "cell {id} lies on two flows");
                assert_eq!(board.cell(*id).affiliation(), path.affiliation);
            }
        }
        assert_eq!(seen.len(), board.len());
    }

    #[test]
    fn rejects_self_loop() {
        let result = Board::new(vec![
            CellDescriptor::terminus(aff(1), Location(0, 0), vec![0, 1]),
            CellDescriptor::terminus(aff(1), Location(1, 0), vec![0]),
        ]);

        assert_eq!(result, Err(InvalidGraph::SelfLoop { cell: 0 }));
    }

    #[test]
    fn rejects_asymmetric_adjacency() {
        let result = Board::new(vec![
            CellDescriptor::terminus(aff(1), Location(0, 0), vec![1]),
            CellDescriptor::terminus(aff(1), Location(1, 0), vec![]),
        ]);

        assert_eq!(result, Err(InvalidGraph::Asymmetric { cell: 0, neighbor: 1 }));
    }

    #[test]
    fn rejects_missing_and_repeated_neighbors() {
        let out_of_range = Board::new(vec![
            CellDescriptor::path(Location(0, 0), vec![3]),
        ]);
        assert_eq!(out_of_range, Err(InvalidGraph::NeighborOutOfRange { cell: 0, neighbor: 3 }));

        let repeated = Board::new(vec![
            CellDescriptor::path(Location(0, 0), vec![1, 1]),
            CellDescriptor::path(Location(1, 0), vec![0]),
        ]);
        assert_eq!(repeated, Err(InvalidGraph::DuplicateNeighbor { cell: 0, neighbor: 1 }));
    }

    #[test]
    fn connection_rules() {
        let mut board = line(4);
        board.assign_termini().unwrap();
        assert!(board.cell(0).is_source());
        assert!(board.cell(3).is_sink());

        assert!(board.can_connect(0, 1));
        // a source never receives
        assert!(!board.can_connect(1, 0));
        // not neighbors
        assert!(!board.can_connect(0, 2));
        // a sink never sends
        assert!(!board.can_connect(3, 2));

        board.connect(0, 1);
        assert_eq!(board.cell(0).next(), Some(1));
        assert_eq!(board.cell(1).prev(), Some(0));
        // already connected, and no doubling back
        assert!(!board.can_connect(0, 1));
        assert!(!board.can_connect(1, 0));
        // 1 already receives from 0
        assert!(!board.can_connect(2, 1));
        // 0 already sends
        assert!(!board.try_connect(0, 2));

        // connecting again is a no-op
        let snapshot = board.clone();
        board.connect(0, 1);
        assert_eq!(board, snapshot);
    }

    #[test]
    fn colors_must_match() {
        // A - . - B, with a second A and B hanging off the ends
        let mut board = Board::new(vec![
            CellDescriptor::terminus(aff(1), Location(0, 0), vec![1, 3]),
            CellDescriptor::path(Location(1, 0), vec![0, 2]),
            CellDescriptor::terminus(aff(2), Location(2, 0), vec![1, 4]),
            CellDescriptor::terminus(aff(1), Location(0, 1), vec![0]),
            CellDescriptor::terminus(aff(2), Location(2, 1), vec![2]),
        ]).unwrap();
        board.assign_termini().unwrap();

        assert!(board.try_connect(0, 1));
        assert_eq!(board.cell(1).affiliation(), 1);
        // 1 is now A and cannot lead into B's sink
        assert!(!board.can_connect(1, 2));
    }

    #[test]
    fn colors_follow_anchors() {
        let mut board = line(5);
        board.assign_termini().unwrap();

        board.connect(1, 2);
        assert!(board.cell(1).is_neutral() && board.cell(2).is_neutral());
        board.connect(2, 3);
        assert!(board.cell(3).is_neutral());

        // reaching the sink paints the whole chain behind it
        board.connect(3, 4);
        assert!((1..=3).all(|id| board.cell(id).affiliation() == 1));

        // the half still anchored by the sink keeps its color, the loose half goes back to neutral
        board.disconnect(2);
        assert!(board.cell(1).is_neutral() && board.cell(2).is_neutral());
        assert_eq!(board.cell(3).affiliation(), 1);

        // a source paints forward
        board.connect(0, 1);
        assert_eq!(board.cell(2).affiliation(), 1);
        board.disconnect(0);
        assert!(board.cell(1).is_neutral() && board.cell(2).is_neutral());
    }

    /// Links agree in both directions, colors match across every link, and every path cell carries the color of the
    /// terminus anchoring its chain, or none.
    fn assert_consistent(board: &Board) {
        let mut receivers = HashSet::new();
        for (id, cell) in board.cells().iter().enumerate() {
            if let Some(next) = cell.next() {
                assert!(receivers.insert(next), "cell {next} receives from two cells");
                assert_eq!(board.cell(next).prev(), Some(id));
                assert_eq!(board.cell(next).affiliation(), cell.affiliation(), "colors differ across {id} -> {next}");
            }
            if let Some(prev) = cell.prev() {
                assert_eq!(board.cell(prev).next(), Some(id));
            }

            if !cell.is_terminus() {
                let first = board.cell(board.chain_end(id, Direction::Backward));
                let last = board.cell(board.chain_end(id, Direction::Forward));
                let anchor = if first.is_source() {
                    first.affiliation()
                } else if last.is_sink() {
                    last.affiliation()
                } else {
                    0
                };
                assert_eq!(cell.affiliation(), anchor, "cell {id} has the wrong color");
            }
        }
    }

    #[test]
    fn random_edits_keep_chains_consistent() {
        let mut board = SquareBoardBuilder::with_dims(dims(4, 4))
            .add_termini('A', (Location(0, 0), Location(3, 3)))
            .add_termini('B', (Location(3, 0), Location(0, 3)))
            .build()
            .unwrap();
        board.assign_termini().unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..20_000 {
            let from = rng.gen_range(0..board.len());
            if board.cell(from).next().is_some() && rng.gen_bool(0.5) {
                board.disconnect(from);
            } else {
                let neighbors = board.neighbors(from);
                let to = neighbors[rng.gen_range(0..neighbors.len())];
                board.try_connect(from, to);
            }
            assert_consistent(&board);
        }

        // the termini themselves are never recolored
        for location in [Location(0, 0), Location(3, 3)] {
            let cell = board.cells().iter().find(|cell| cell.location() == location).unwrap();
            assert_eq!(cell.affiliation(), 1);
        }
    }

    #[test]
    #[should_panic(expected = "illegal connection")]
    fn connect_rejects_illegal_link() {
        let mut board = line(4);
        board.assign_termini().unwrap();
        board.connect(0, 1);
        // 1 already receives from 0
        board.connect(2, 1);
    }

    #[test]
    fn disconnect_then_reconnect_is_identity() {
        let mut board = line(6);
        board.assign_termini().unwrap();
        for (from, to) in [(0, 1), (1, 2), (3, 4), (4, 5)] {
            board.connect(from, to);
        }

        for from in [0, 1, 3, 4] {
            let to = board.cell(from).next().unwrap();
            let snapshot = board.clone();
            board.disconnect(from);
            assert_eq!(board.cell(to).prev(), None);
            board.connect(from, to);
            assert_eq!(board, snapshot);
        }
    }

    #[test]
    fn adjacent_termini() {
        let mut board = Board::new(vec![
            CellDescriptor::terminus(aff(1), Location(0, 0), vec![1]),
            CellDescriptor::terminus(aff(1), Location(1, 0), vec![0]),
        ]).unwrap();

        assert!(board.solve());
        assert_eq!(board.paths().len(), 1);
        assert_eq!(board.paths()[0].cells, vec![0, 1]);
        assert_eq!(format!("{}", board), "AA\n");
    }

    #[test]
    fn large_affiliation_ids() {
        let mut board = Board::new(vec![
            CellDescriptor::terminus(aff(usize::MAX), Location(0, 0), vec![1]),
            CellDescriptor::terminus(aff(usize::MAX), Location(1, 0), vec![0]),
            CellDescriptor::terminus(aff(50_000_000), Location(0, 1), vec![3]),
            CellDescriptor::terminus(aff(50_000_000), Location(1, 1), vec![2]),
        ]).unwrap();
        assert!(board.affiliation_displays.is_empty());

        assert!(board.solve());
        assert_covered(&board);
        assert_eq!(board.paths()[0].affiliation, usize::MAX);
        assert_eq!(format!("{}", board), "??\n??\n");
    }

    #[test]
    fn default_displays() {
        assert_eq!(default_display(0), '.');
        assert_eq!(default_display(1), 'A');
        assert_eq!(default_display(26), 'Z');
        assert_eq!(default_display(27), '?');
        assert_eq!(default_display(usize::MAX - 9), '?');
        assert_eq!(default_display(usize::MAX), '?');
    }

    #[test]
    fn display_needs_grid_coordinates() {
        use std::fmt::Write;

        let board = Board::new(vec![
            CellDescriptor::terminus(aff(1), Location(usize::MAX - 1, usize::MAX), vec![1]),
            CellDescriptor::terminus(aff(1), Location(usize::MAX, usize::MAX), vec![0]),
        ]).unwrap();

        let mut out = String::new();
        assert!(write!(out, "{}", board).is_err());
    }

    #[test]
    fn straight_line() {
        let mut board = line(7);

        assert!(board.solve());
        assert_covered(&board);
        let paths = board.paths();
        assert_eq!(paths[0].cells, (0..7).collect::<Vec<_>>());
        assert_eq!(paths[0].locations(&board), (0..7).map(|x| Location(x, 0)).collect::<Vec<_>>());
        assert_eq!(format!("{}", board), "AaaaaaA\n");
    }

    #[test]
    fn shared_neutral_is_unsolvable() {
        // two colors, each of whose termini touch only the cell in the middle
        let mut board = Board::new(vec![
            CellDescriptor::terminus(aff(1), Location(1, 0), vec![4]),
            CellDescriptor::terminus(aff(1), Location(1, 2), vec![4]),
            CellDescriptor::terminus(aff(2), Location(0, 1), vec![4]),
            CellDescriptor::terminus(aff(2), Location(2, 1), vec![4]),
            CellDescriptor::path(Location(1, 1), vec![0, 1, 2, 3]),
        ]).unwrap();
        let mut untouched = board.clone();
        untouched.assign_termini().unwrap();

        assert_eq!(board.solve_with(SolverOptions::default()), Err(SolverFailure::Exhausted));
        // everything the search tried was undone
        assert_eq!(board, untouched);
        assert!(!board.solve());
    }

    #[test]
    fn three_termini_of_one_color() {
        let mut board = Board::new(vec![
            CellDescriptor::terminus(aff(1), Location(0, 0), vec![1]),
            CellDescriptor::terminus(aff(1), Location(1, 0), vec![0, 2]),
            CellDescriptor::terminus(aff(1), Location(2, 0), vec![1]),
        ]).unwrap();
        let untouched = board.clone();

        assert_eq!(board.solve_with(SolverOptions::default()), Err(SolverFailure::TooManyTermini { affiliation: 1 }));
        assert_eq!(board, untouched);
        assert!(!board.solve());
    }

    #[test]
    fn lone_terminus() {
        let mut board = Board::new(vec![
            CellDescriptor::terminus(aff(1), Location(0, 0), vec![1]),
            CellDescriptor::terminus(aff(1), Location(1, 0), vec![0, 2]),
            CellDescriptor::terminus(aff(2), Location(2, 0), vec![1]),
        ]).unwrap();

        assert_eq!(board.solve_with(SolverOptions::default()), Err(SolverFailure::UnpairedTerminus { affiliation: 2 }));
    }

    #[test]
    fn orphan_alongside_solvable() {
        let mut board = Board::new(vec![
            CellDescriptor::terminus(aff(1), Location(0, 0), vec![1]),
            CellDescriptor::terminus(aff(1), Location(1, 0), vec![0]),
            CellDescriptor::path(Location(3, 0), vec![]),
        ]).unwrap();
        assert!(board.cell(2).is_orphan());

        assert_eq!(board.solve_with(SolverOptions::default()), Err(SolverFailure::Orphaned { cell: 2 }));
        assert!(!board.solve());
    }

    #[test]
    fn empty_board() {
        let mut board = Board::new(vec![]).unwrap();
        assert!(board.is_empty());
        assert!(!board.solve());
    }

    #[test]
    fn sink_validity_is_weak() {
        let mut board = line(3);
        board.assign_termini().unwrap();

        // nothing reaches the sink, yet it counts as satisfied
        assert!(board.is_valid(2));
        assert!(!board.is_valid(0));
        assert!(!board.is_valid(1));
    }

    #[test]
    fn remove_termini() {
        let board = SquareBoardBuilder::with_dims(dims(5, 5))
            .add_termini('A', (Location(0, 0), Location(1, 4)))
            .pop_termini()
            .build()
            .unwrap();

        assert_eq!(format!("{}", board), ".....
.....
.....
.....
.....
");
    }

    #[test]
    fn builder_out_of_bounds() {
        let mut builder = SquareBoardBuilder::with_dims(dims(3, 3));
        builder.add_termini('A', (Location(0, 0), Location(3, 0)));

        assert_eq!(builder.is_valid(), Some(&vec![BuilderInvalidReason::FeatureOutOfBounds]));
        assert_eq!(builder.build(), Err(BuildError::Invalid(vec![BuilderInvalidReason::FeatureOutOfBounds])));
    }

    #[test]
    fn warp_away_from_edge() {
        let mut builder = SquareBoardBuilder::with_dims(dims(3, 3));
        builder.add_warp(Location(1, 1), None);
        assert_eq!(builder.is_valid(), Some(&vec![BuilderInvalidReason::WarpBadDirection]));

        let mut corner = SquareBoardBuilder::with_dims(dims(3, 3));
        corner.add_warp(Location(0, 0), None);
        assert_eq!(corner.is_valid(), Some(&vec![BuilderInvalidReason::WarpBadDirection]));

        let mut pointing_inward = SquareBoardBuilder::with_dims(dims(3, 3));
        pointing_inward.add_warp(Location(0, 0), Some(SquareStep::Down));
        assert_eq!(pointing_inward.is_valid(), Some(&vec![BuilderInvalidReason::WarpBadDirection]));
    }

    #[test]
    fn warp_links_opposite_edges() {
        let board = SquareBoardBuilder::with_dims(dims(3, 3))
            .add_warp(Location(0, 1), None)
            .add_warp(Location(2, 0), Some(SquareStep::Up))
            .build()
            .unwrap();
        let id_of = |location: Location| board.cells().iter().position(|cell| cell.location() == location).unwrap();

        assert!(board.neighbors(id_of(Location(0, 1))).contains(&id_of(Location(2, 1))));
        assert!(board.neighbors(id_of(Location(2, 1))).contains(&id_of(Location(0, 1))));
        assert!(board.neighbors(id_of(Location(2, 0))).contains(&id_of(Location(2, 2))));
        assert_eq!(board.neighbors(id_of(Location(2, 0))).len(), 3);
    }

    #[test]
    fn two_by_two() {
        let mut board = SquareBoardBuilder::with_dims(dims(2, 2))
            .add_termini('A', (Location(0, 0), Location(1, 0)))
            .add_termini('B', (Location(0, 1), Location(1, 1)))
            .build()
            .unwrap();

        assert!(board.solve());
        assert_covered(&board);
        assert_eq!(format!("{}", board), "AA
BB
");
    }

    #[test]
    fn wall_blocks_only_route() {
        let mut board = SquareBoardBuilder::with_dims(dims(2, 2))
            .add_termini('A', (Location(0, 0), Location(1, 0)))
            .add_termini('B', (Location(0, 1), Location(1, 1)))
            .disconnect(UnorderedPair::from((Location(0, 0), Location(1, 0))))
            .build()
            .unwrap();

        assert!(!board.solve());
        assert!(board.cells().iter().all(|cell| cell.next().is_none() && cell.prev().is_none()));
    }

    #[test]
    fn single_flow_cannot_snake() {
        // covering a 3x3 board with one flow forces it to run alongside itself, which the search never allows
        let mut board = SquareBoardBuilder::with_dims(dims(3, 3))
            .add_termini('A', (Location(0, 0), Location(2, 2)))
            .build()
            .unwrap();

        assert_eq!(board.solve_with(SolverOptions::default()), Err(SolverFailure::Exhausted));
    }

    #[test]
    fn solve_most_basic() {
        // flow free classic pack level 1
        let mut board = SquareBoardBuilder::with_dims(dims(5, 5))
            .add_termini('A', (Location(0, 0), Location(1, 4)))
            .add_termini('B', (Location(2, 0), Location(1, 3)))
            .add_termini('C', (Location(2, 1), Location(2, 4)))
            .add_termini('D', (Location(4, 0), Location(3, 3)))
            .add_termini('E', (Location(4, 1), Location(3, 4)))
            .build()
            .unwrap();

        assert_eq!(format!("{}", board), "A.B.D
..C.E
.....
.B.D.
.ACE.
");

        let stats = board.solve_with(SolverOptions::default()).unwrap();
        assert!(stats.steps >= board.len() as u64);
        assert_covered(&board);
        assert_eq!(board.paths().len(), 5);
        assert_eq!(format!("{}", board), "AbBdD
abCdE
abcde
aBcDe
aACEe
")
    }

    #[test]
    fn step_limit_restores_board() {
        let builder = SquareBoardBuilder::with_dims(dims(5, 5))
            .add_termini('A', (Location(0, 0), Location(1, 4)))
            .add_termini('B', (Location(2, 0), Location(1, 3)))
            .add_termini('C', (Location(2, 1), Location(2, 4)))
            .add_termini('D', (Location(4, 0), Location(3, 3)))
            .add_termini('E', (Location(4, 1), Location(3, 4)))
            .clone();
        let mut board = builder.build().unwrap();
        let mut untouched = board.clone();
        untouched.assign_termini().unwrap();

        assert_eq!(
            board.solve_with(SolverOptions::default().with_step_limit(10)),
            Err(SolverFailure::StepLimitReached { limit: 10 }),
        );
        assert_eq!(board, untouched);

        // nothing left over gets in the way of a full solve
        assert!(board.solve());
        assert_covered(&board);
    }

    #[test]
    fn simple_with_warp() {
        // flow free warps starter pack level 2
        let mut board = SquareBoardBuilder::with_dims(dims(5, 3))
            .add_termini('A', (Location(0, 0), Location(4, 0)))
            .add_termini('B', (Location(3, 1), Location(4, 2)))
            .add_termini('C', (Location(0, 2), Location(2, 1)))
            .add_termini('D', (Location(1, 1), Location(4, 1)))
            .add_warp(Location(0, 1), None)
            .build()
            .unwrap();

        assert_eq!(format!("{}", board), "A...A
.DCBD
C...B
");

        assert!(board.solve());
        assert_covered(&board);
        assert_eq!(format!("{}", board), "AaaaA
dDCBD
CccbB
");
    }

    #[test]
    fn warp_with_holes() {
        // flow free warps starter pack level 1
        let mut board = SquareBoardBuilder::with_dims(dims(6, 3))
            .add_termini('A', (Location(0, 1), Location(4, 1)))
            .add_termini('B', (Location(1, 0), Location(3, 0)))
            .add_termini('C', (Location(1, 1), Location(3, 1)))
            .add_termini('D', (Location(1, 2), Location(3, 2)))
            .add_warp(Location(0, 1), None)
            .drop_location(Location(0, 0))
            .drop_location(Location(0, 2))
            .drop_location(Location(4, 0))
            .drop_location(Location(5, 0))
            .drop_location(Location(4, 2))
            .drop_location(Location(5, 2))
            .build()
            .unwrap();

        assert_eq!(format!("{}", board), ".B.B..
AC.CA.
.D.D..
");

        assert!(board.solve());
        assert_covered(&board);
        assert_eq!(format!("{}", board), ".BbB..
ACcCAa
.DdD..
");

        // A leaves through the warp and comes back in from the far side
        let a = board.paths().into_iter().find(|path| path.affiliation == 1).unwrap();
        assert_eq!(a.locations(&board), vec![Location(0, 1), Location(5, 1), Location(4, 1)]);
    }
}
