use dioxus::html::geometry::WheelDelta;
use mapmark_shared::viewport::{ContainerRect, ScreenPoint};

/// Pixels per wheel "line" and "page" when the browser reports those units.
const LINE_PX: f64 = 40.0;
const PAGE_PX: f64 = 400.0;

/// Convert client (viewport) coordinates to container-relative pixel coordinates.
pub fn client_to_container(client_x: f64, client_y: f64, rect_left: f64, rect_top: f64) -> ScreenPoint {
    ScreenPoint::new(client_x - rect_left, client_y - rect_top)
}

/// Convert a wheel delta (pixels / lines / pages) to pixels.
pub fn wheel_delta_y(delta: WheelDelta) -> f64 {
    match delta {
        WheelDelta::Pixels(d) => d.y,
        WheelDelta::Lines(d) => d.y * LINE_PX,
        WheelDelta::Pages(d) => d.y * PAGE_PX,
    }
}

fn bounding_rect(element_id: &str) -> Option<web_sys::DomRect> {
    let document = web_sys::window()?.document()?;
    let element = document.get_element_by_id(element_id)?;
    Some(element.get_bounding_client_rect())
}

/// Current size of the element, or `None` before it is in the DOM.
pub fn container_rect(element_id: &str) -> Option<ContainerRect> {
    let rect = bounding_rect(element_id)?;
    Some(ContainerRect::new(rect.width(), rect.height()))
}

/// Client coordinates relative to the element's top-left corner.
pub fn pointer_in_container(client_x: f64, client_y: f64, element_id: &str) -> Option<ScreenPoint> {
    let rect = bounding_rect(element_id)?;
    Some(client_to_container(client_x, client_y, rect.left(), rect.top()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dioxus::html::geometry::euclid::Vector3D;

    #[test]
    fn test_client_to_container_origin() {
        let p = client_to_container(100.0, 50.0, 100.0, 50.0);
        assert_eq!(p, ScreenPoint::new(0.0, 0.0));
    }

    #[test]
    fn test_client_to_container_offset() {
        let p = client_to_container(350.0, 275.0, 100.0, 50.0);
        assert!((p.x - 250.0).abs() < 1e-9);
        assert!((p.y - 225.0).abs() < 1e-9);
    }

    #[test]
    fn test_wheel_delta_pixels_pass_through() {
        assert_eq!(wheel_delta_y(WheelDelta::Pixels(Vector3D::new(0.0, -120.0, 0.0))), -120.0);
    }

    #[test]
    fn test_wheel_delta_lines_and_pages_scale() {
        assert_eq!(wheel_delta_y(WheelDelta::Lines(Vector3D::new(0.0, 3.0, 0.0))), 120.0);
        assert_eq!(wheel_delta_y(WheelDelta::Pages(Vector3D::new(0.0, -1.0, 0.0))), -400.0);
    }
}
