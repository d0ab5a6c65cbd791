use std::rc::Rc;

use minegrid_core::{CellVisualState, GridAction, GridConfig, MAX_ADJACENT_COUNT};
use ndarray::Array2;
use yew::prelude::*;

use crate::board::GridCanvas;

/// Stand-in for a rules engine: reveals on primary actions and cycles
/// flag/question marks on secondary ones.
pub fn echo_action(cells: &mut Array2<CellVisualState>, action: GridAction) {
    use CellVisualState::*;

    let (column, row) = action.coords();
    let Some(cell) = cells.get_mut((row, column)) else {
        log::warn!("action outside the snapshot: {action:?}");
        return;
    };
    *cell = match (action, *cell) {
        (GridAction::Primary { .. }, Hidden | Marked) => {
            Revealed(((column * 7 + row * 3) % (usize::from(MAX_ADJACENT_COUNT) + 1)) as u8)
        }
        (GridAction::Secondary { .. }, Hidden) => Flagged,
        (GridAction::Secondary { .. }, Flagged) => Marked,
        (GridAction::Secondary { .. }, Marked) => Hidden,
        (_, unchanged) => unchanged,
    };
}

#[derive(Clone, PartialEq)]
struct Board {
    cells: Rc<Array2<CellVisualState>>,
}

impl Reducible for Board {
    type Action = GridAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        let mut cells = self.cells.as_ref().clone();
        echo_action(&mut cells, action);
        Rc::new(Self {
            cells: Rc::new(cells),
        })
    }
}

#[derive(Properties, PartialEq)]
pub struct PreviewProps {
    pub config: GridConfig,
}

#[function_component(Preview)]
pub fn preview(props: &PreviewProps) -> Html {
    let config = props.config;
    let board = use_reducer(|| Board {
        cells: Rc::new(Array2::from_elem(
            (config.rows, config.columns),
            CellVisualState::Hidden,
        )),
    });
    let on_action = use_callback(board.dispatcher(), |action: GridAction, dispatcher| {
        log::info!("{action:?}");
        dispatcher.dispatch(action);
    });

    html! {
        <GridCanvas cells={board.cells.clone()} {config} {on_action} />
    }
}
