use brawl_engine::{Canvas, Rgb};

use super::panel::{PanelState, PlayerPanel};
use super::wheel::{CENTER_SLOT, VISIBLE_SLOTS};

const BACKGROUND: [u8; 4] = [128, 128, 128, 255];
const PANEL_MARGIN: i32 = 8;
const OUTLINE: [u8; 4] = [255, 255, 255, 255];
const MARKER_SIZE: u32 = 12;
const PIP_SIZE: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PanelRect {
    pub(crate) left: i32,
    pub(crate) top: i32,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

/// Panels share the lower half of the window, one column per slot.
pub(crate) fn panel_rect(slot: usize, slots: usize, width: u32, height: u32) -> PanelRect {
    let slots = slots.max(1) as u32;
    let column = width / slots;
    let inner_width = column.saturating_sub(2 * PANEL_MARGIN as u32);
    let top = (height / 2) as i32;
    PanelRect {
        left: (column * slot as u32) as i32 + PANEL_MARGIN,
        top,
        width: inner_width,
        height: (height / 2).saturating_sub(PANEL_MARGIN as u32),
    }
}

pub(crate) fn render_selection(panels: &[PlayerPanel], canvas: &mut Canvas<'_>) {
    canvas.clear(BACKGROUND);
    let (width, height) = (canvas.width(), canvas.height());
    for panel in panels {
        let rect = panel_rect(panel.slot(), panels.len(), width, height);
        draw_panel(panel, rect, canvas);
    }
}

fn draw_panel(panel: &PlayerPanel, rect: PanelRect, canvas: &mut Canvas<'_>) {
    canvas.fill_rect(rect.left, rect.top, rect.width, rect.height, panel.fill().rgba(255));
    canvas.outline_rect(rect.left, rect.top, rect.width, rect.height, OUTLINE);
    if panel.state() == PanelState::Closed {
        return;
    }

    let wheel = panel.wheel();
    let fighters = wheel.fighters();
    let icon_width = fighters[0].css_icon.width.max(1);
    let scale = (rect.width / VISIBLE_SLOTS as u32 / icon_width).max(1);
    let cell = (icon_width * scale) as i32;
    let strip_left = rect.left + (rect.width as i32 - cell * VISIBLE_SLOTS as i32) / 2;
    let strip_top = rect.top + PANEL_MARGIN;

    // A confirmed panel shows the wheel as it was frozen, fading out.
    let (visible, fade) = match panel.snapshot() {
        Some(snapshot) => (snapshot.visible, Some(snapshot.alpha)),
        None => (*wheel.visible(), None),
    };
    for (column, roster_index) in visible.iter().enumerate() {
        let alpha = wheel.alpha()[column];
        let alpha = fade.map_or(alpha, |fade| alpha.min(fade));
        let left = strip_left + cell * column as i32;
        let icon = &fighters[*roster_index].css_icon;
        canvas.draw_sprite(icon, left, strip_top, scale, alpha, None);
        if column == CENTER_SLOT {
            canvas.outline_rect(left, strip_top, cell as u32, cell as u32, OUTLINE);
        }
    }

    let marker_top = strip_top + cell + PANEL_MARGIN;
    canvas.fill_rect(
        rect.left + PANEL_MARGIN,
        marker_top,
        MARKER_SIZE,
        MARKER_SIZE,
        panel.icon_color().rgba(255),
    );

    let Some(chosen) = panel.chosen() else {
        return;
    };
    let portrait_scale = scale * 2;
    let portrait_left = rect.left + (rect.width as i32 - (icon_width * portrait_scale) as i32) / 2;
    let portrait_top = marker_top + MARKER_SIZE as i32 + PANEL_MARGIN;
    canvas.draw_sprite(
        &chosen.css_icon,
        portrait_left,
        portrait_top,
        portrait_scale,
        255,
        Some(chosen.palette_color(panel.color_index())),
    );
    canvas.draw_sprite(
        &chosen.franchise_icon,
        rect.left + PANEL_MARGIN,
        portrait_top,
        scale,
        200,
        Some(panel.icon_color()),
    );

    let pips_top = portrait_top + (icon_width * portrait_scale) as i32 + PANEL_MARGIN;
    for costume in 0..chosen.costume_count {
        let color = if costume == panel.costume_index() {
            Rgb::NEUTRAL.rgba(255)
        } else {
            Rgb::NEUTRAL.rgba(96)
        };
        let left = rect.left + PANEL_MARGIN + (costume as i32) * (PIP_SIZE as i32 + 2);
        canvas.fill_rect(left, pips_top, PIP_SIZE, PIP_SIZE, color);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use brawl_engine::FighterDescriptor;

    use super::super::wheel::FighterWheel;
    use super::*;

    #[test]
    fn panels_split_the_lower_half() {
        let first = panel_rect(0, 4, 800, 600);
        let last = panel_rect(3, 4, 800, 600);
        assert_eq!(first.left, PANEL_MARGIN);
        assert_eq!(first.top, 300);
        assert_eq!(first.width, 200 - 2 * PANEL_MARGIN as u32);
        assert_eq!(last.left, 600 + PANEL_MARGIN);
        assert!(last.left + last.width as i32 <= 800);
    }

    #[test]
    fn closed_panel_is_filled_with_the_player_colour() {
        let fighters: Arc<[FighterDescriptor]> = vec![FighterDescriptor::placeholder(
            "hero",
            "Hero",
            vec![Rgb::new(200, 0, 0)],
            1,
        )]
        .into();
        let wheel = FighterWheel::new(fighters).expect("wheel");
        let panels = vec![PlayerPanel::new(0, Rgb::new(10, 20, 30), wheel)];

        let (width, height) = (64u32, 64u32);
        let mut frame = vec![0u8; (width * height * 4) as usize];
        let mut canvas = Canvas::new(&mut frame, width, height);
        render_selection(&panels, &mut canvas);

        let rect = panel_rect(0, 1, width, height);
        let x = (rect.left + 4) as usize;
        let y = (rect.top + 4) as usize;
        let offset = (y * width as usize + x) * 4;
        assert_eq!(&frame[offset..offset + 4], &[10, 20, 30, 255]);
        assert_eq!(&frame[0..4], &BACKGROUND);
    }
}
