use std::collections::{HashMap, HashSet};
use std::num::NonZero;

use itertools::Itertools;
use ndarray::Array2;
use petgraph::graphmap::UnGraphMap;
use thiserror::Error;
use unordered_pair::UnorderedPair;

use crate::affiliation::{AffiliationID, NULL_AFFILIATION};
use crate::board::{Board, InvalidGraph};
use crate::location::{Dimension, Location};
use crate::shape::{BoardShape, SquareStep, Step};

/// Reasons a builder may become invalid while building.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BuilderInvalidReason {
    /// A feature like a terminus was inserted outside the bounds specified by `dims` on a builder.
    FeatureOutOfBounds,
    /// A warp was inserted in a direction which does not make sense; e.g. attempting to place warp on the right edge in the up direction.
    WarpBadDirection,
}

/// Reasons [`Builder::build`] may fail.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum BuildError {
    /// The builder entered an invalid state at some point.
    #[error("builder is invalid: {0:?}")]
    Invalid(Vec<BuilderInvalidReason>),
    /// The assembled graph was rejected by [`Board::new`].
    #[error(transparent)]
    Graph(#[from] InvalidGraph),
}

/// Functionality all builders must implement, parametrised over the grid shape `Sh` of the resulting board.
///
/// Builders mutate themselves while building but can be [`Clone`]d to save their state at some point.
pub trait Builder<Sh: BoardShape>: Clone {
    /// Construct a new [`Self`] with the specified dimensions, specified in `(x, y)` order.
    fn with_dims(dims: (Dimension, Dimension)) -> Self;
    /// Add termini or "flow endpoints". Which of the two becomes the source is decided by cell order at solve time.
    ///
    /// May cause the builder to enter a [`FeatureOutOfBounds`](BuilderInvalidReason::FeatureOutOfBounds) invalid state if either location is out of bounds.
    /// If the builder is already in an invalid state, this function does nothing.
    fn add_termini(&mut self, display: char, locations: (Location, Location)) -> &mut Self;
    /// Remove the most recently added pair of termini.
    ///
    /// If the builder is in an invalid state or no termini are present, this function does nothing.
    fn pop_termini(&mut self) -> &mut Self;
    /// Drop a location from the board.
    /// Any terminus or warp here will be deleted regardless of where in the chain this method is called.
    /// Keep in mind this may cause the board to become unsolvable.
    ///
    /// May cause the builder to enter a [`FeatureOutOfBounds`](BuilderInvalidReason::FeatureOutOfBounds) invalid state if `location` is out of bounds.
    /// If the builder is already in an invalid state, this function does nothing.
    fn drop_location(&mut self, location: Location) -> &mut Self;
    /// Disconnect the two `locations`, i.e. place a wall between them.
    ///
    /// A wall prevents paths from crossing it.
    /// If the two locations are not adjacent, this function does nothing and does not invalidate the builder.
    ///
    /// May cause the builder to enter a [`FeatureOutOfBounds`](BuilderInvalidReason::FeatureOutOfBounds) invalid state if either location is out of bounds.
    fn disconnect(&mut self, locations: UnorderedPair<Location>) -> &mut Self;
    /// Shorthand for multiple calls to [`Self::disconnect`], with the same conditions.
    ///
    /// Disconnect cells neighboring `location`.
    fn disconnect_around(&mut self, location: Location, directions: Vec<Sh>) -> &mut Self;
    /// Check the validity of this builder, ensuring no [`BuilderInvalidReason`] condition has arisen.
    ///
    /// Returns `None` if the builder is valid, `Some(&Vec<BuilderInvalidReason>)` otherwise.
    fn is_valid(&self) -> Option<&Vec<BuilderInvalidReason>>;
    /// Convert the state of this builder into a [`Board`].
    fn build(&self) -> Result<Board, BuildError>;
}

/// A builder for boards with square-shaped cells, i.e. the rectangular boards found in Flow Free and its Warps expansion.
///
/// Cells of the built board are numbered row by row from the top left, which is also the order the solver visits them in.
#[derive(Clone)]
pub struct SquareBoardBuilder {
    // width, height
    dims: (Dimension, Dimension),
    termini: Array2<AffiliationID>,
    affiliation_displays: Vec<char>,
    invalid_reasons: Vec<BuilderInvalidReason>,
    // walls
    edge_blacklist: HashSet<UnorderedPair<Location>>,
    // holes
    location_blacklist: HashSet<Location>,
    // warps
    edge_whitelist: HashSet<UnorderedPair<Location>>,
}

impl Default for SquareBoardBuilder {
    fn default() -> Self {
        Self::with_dims((NonZero::new(5).unwrap(), NonZero::new(5).unwrap()))
    }
}

impl Builder<SquareStep> for SquareBoardBuilder {
    fn with_dims(dims: (Dimension, Dimension)) -> Self {
        Self {
            dims,
            termini: Array2::from_elem((dims.1.get(), dims.0.get()), NULL_AFFILIATION),

            invalid_reasons: Default::default(),
            edge_blacklist: Default::default(),
            location_blacklist: Default::default(),
            edge_whitelist: Default::default(),
            affiliation_displays: Default::default(),
        }
    }

    fn add_termini(&mut self, display: char, locations: (Location, Location)) -> &mut Self {
        if !self.invalid_reasons.is_empty() {
            return self;
        }

        if !self.in_bounds(locations.0) || !self.in_bounds(locations.1) {
            self.invalid_reasons.push(BuilderInvalidReason::FeatureOutOfBounds);
            return self;
        }

        // non-null affiliation IDs start at 1
        let aff = self.affiliation_displays.len() + 1;
        self.affiliation_displays.push(display);
        for location in [locations.0, locations.1] {
            self.termini[location.as_index()] = aff;
        }

        self
    }

    fn pop_termini(&mut self) -> &mut Self {
        if !self.invalid_reasons.is_empty() {
            return self;
        }

        let aff_to_remove = self.affiliation_displays.len();
        if self.affiliation_displays.pop().is_some() {
            self.termini.map_inplace(|aff| if *aff == aff_to_remove {
                *aff = NULL_AFFILIATION;
            })
        }

        self
    }

    fn drop_location(&mut self, location: Location) -> &mut Self {
        if !self.invalid_reasons.is_empty() {
            return self;
        }

        if !self.in_bounds(location) {
            self.invalid_reasons.push(BuilderInvalidReason::FeatureOutOfBounds);
            return self;
        }

        self.location_blacklist.insert(location);
        self
    }

    fn disconnect(&mut self, locations: UnorderedPair<Location>) -> &mut Self {
        if !self.in_bounds(locations.0) || !self.in_bounds(locations.1) {
            self.invalid_reasons.push(BuilderInvalidReason::FeatureOutOfBounds);
            return self;
        }

        if SquareStep::direction_to(locations.0, locations.1).is_none() {
            return self;
        }

        self.edge_blacklist.insert(locations);

        self
    }

    fn disconnect_around(&mut self, location: Location, directions: Vec<SquareStep>) -> &mut Self {
        for direction in directions {
            self.disconnect(UnorderedPair::from((location, direction.attempt_from(location))));
        }

        self
    }

    fn is_valid(&self) -> Option<&Vec<BuilderInvalidReason>> {
        if self.invalid_reasons.is_empty() {
            None
        } else {
            Some(&self.invalid_reasons)
        }
    }

    fn build(&self) -> Result<Board, BuildError> {
        if !self.invalid_reasons.is_empty() {
            return Err(BuildError::Invalid(self.invalid_reasons.clone()));
        }

        let mut graph: UnGraphMap<Location, ()> = UnGraphMap::with_capacity(
            self.termini.len(),
            // "horizontal" edges
            (self.dims.0.get() - 1) * self.dims.1.get()
                // "vertical" edges
                + (self.dims.1.get() - 1) * self.dims.0.get(),
        );

        for x in 0..self.dims.0.get() {
            for y in 0..self.dims.1.get() {
                let location = Location(x, y);
                graph.add_node(location);

                // add edges down and to the right, if possible
                for direction in SquareStep::FORWARD_VARIANTS.iter().rev() {
                    let other = direction.attempt_from(location);
                    if self.in_bounds(other) {
                        graph.add_edge(location, other, ());
                    }
                }
            }
        }

        // graph edits shuffle adjacency lists, so apply them in a fixed order to keep the search order reproducible
        for UnorderedPair(l1, l2) in self.edge_whitelist.iter().sorted_by_key(|pair| pair_key(pair)) {
            graph.add_edge(*l1, *l2, ());
        }

        for location in self.location_blacklist.iter().sorted() {
            graph.remove_node(*location);
        }

        for UnorderedPair(l1, l2) in self.edge_blacklist.iter().sorted_by_key(|pair| pair_key(pair)) {
            graph.remove_edge(*l1, *l2);
        }

        let termini: HashMap<Location, NonZero<AffiliationID>> = self.termini.indexed_iter()
            .filter(|(index, _)| !self.location_blacklist.contains(&Location::from(*index)))
            .filter_map(|(index, aff)| NonZero::new(*aff).map(|aff| (Location::from(index), aff)))
            .collect();

        // non-null affiliation IDs start at 1
        let affiliation_displays: HashMap<AffiliationID, char> = self.affiliation_displays.iter()
            .enumerate()
            .map(|(index, display)| (index + 1, *display))
            .collect();

        Ok(Board::from_graph(&graph, &termini)?.with_displays(affiliation_displays))
    }
}

fn pair_key(pair: &UnorderedPair<Location>) -> (Location, Location) {
    let UnorderedPair(a, b) = *pair;
    (a.min(b), a.max(b))
}

impl SquareBoardBuilder {
    #[inline]
    fn max_loc(&self) -> Location {
        Location(self.dims.0.get() - 1, self.dims.1.get() - 1)
    }

    #[inline]
    fn in_bounds(&self, location: Location) -> bool {
        location.0 < self.dims.0.get() && location.1 < self.dims.1.get()
    }

    /// Add a warp at the specified `location` pointing in `direction`.
    /// A warp is located on one edge of the board and connects one cell to its partner on the opposite edge of the board along a cardinal direction.
    ///
    /// Specifying `direction` is necessary if and only if `location` is at a corner, in which case the direction is ambiguous.
    /// If `location` is on an edge but not at a corner, `direction` is ignored regardless of whether it is specified.
    ///
    /// May cause the builder to enter a [`FeatureOutOfBounds`](BuilderInvalidReason::FeatureOutOfBounds) invalid state if `location` is out of bounds.
    /// May cause the builder to enter a [`WarpBadDirection`](BuilderInvalidReason::WarpBadDirection) invalid state if `location` is not on an edge,
    /// or is at a corner and `direction` is missing or is impossible for a warp at this location.
    /// If the builder is already in an invalid state, this function does nothing.
    pub fn add_warp(&mut self, location: Location, direction: Option<SquareStep>) -> &mut Self {
        if !self.invalid_reasons.is_empty() {
            return self;
        }

        if !self.in_bounds(location) {
            self.invalid_reasons.push(BuilderInvalidReason::FeatureOutOfBounds);
            return self;
        }

        let max = self.max_loc();
        let on_vertical_edge = location.0 == 0 || location.0 == max.0;
        let on_horizontal_edge = location.1 == 0 || location.1 == max.1;

        // not on any edge
        if !on_vertical_edge && !on_horizontal_edge {
            self.invalid_reasons.push(BuilderInvalidReason::WarpBadDirection);
            return self;
        }

        let edge = if on_vertical_edge && on_horizontal_edge {
            match direction {
                Some(direction) => direction,
                None => {
                    self.invalid_reasons.push(BuilderInvalidReason::WarpBadDirection);
                    return self;
                }
            }
        } else {
            match location {
                Location(0, _) => SquareStep::Left,
                Location(_, 0) => SquareStep::Up,
                Location(x, _) if x == max.0 => SquareStep::Right,
                _ => SquareStep::Down,
            }
        };

        let partner = match edge {
            SquareStep::Up => Location(location.0, max.1),
            SquareStep::Down => Location(location.0, 0),
            SquareStep::Left => Location(max.0, location.1),
            SquareStep::Right => Location(0, location.1),
        };

        if partner == location {
            // then the given direction was bad
            // e.g. top-left corner with down direction specified => "partner" is the first cell in the column => this condition succeeds
            self.invalid_reasons.push(BuilderInvalidReason::WarpBadDirection);
            return self;
        }

        self.edge_whitelist.insert(UnorderedPair::from((location, partner)));

        self
    }
}
