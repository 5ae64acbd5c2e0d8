use walkcycle::pathfinding::{format_path, GridPathfinder, Pathfinder, Point, RouteRequest};
use walkcycle::plan::WalkSpeed;
use walkcycle::WalkableMask;

/// Build a mask of 10x10 cells from rows of '.' (walkable) and '#' (wall)
fn mask_from_str(grid_str: &str) -> WalkableMask {
    let lines: Vec<&str> = grid_str.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    let rows = lines.len() as i32;
    let cols = lines[0].chars().count() as i32;
    let mut mask = WalkableMask::new(rows, cols, 10, 10);
    for (y, line) in lines.iter().enumerate() {
        for (x, ch) in line.chars().enumerate() {
            if ch == '#' {
                mask.set_cell(x as i32, y as i32, 1);
            }
        }
    }
    mask
}

fn request(start: Point, end: Point) -> RouteRequest {
    RouteRequest {
        start,
        end,
        speed: WalkSpeed::uniform(3),
        ignore_walls: false,
    }
}

/// Visualize a route on the mask
fn visualize(mask: &WalkableMask, waypoints: &[Point]) -> String {
    let mut result = format!("\nPath: {}\n", format_path(waypoints));
    for y in 0..mask.rows {
        for x in 0..mask.cols {
            let symbol = if waypoints.iter().any(|p| mask.cell_of(*p) == (x, y)) {
                '*'
            } else if mask.is_blocked(x, y) {
                '#'
            } else {
                '.'
            };
            result.push(symbol);
        }
        result.push('\n');
    }
    result
}

const WALLED: &str = r#"
    ..........
    ..........
    .....#....
    .....#....
    .....#....
    .....#....
    .....#....
    .....#....
    ..........
    ..........
"#;

#[test]
fn test_straight_route_when_in_sight() {
    let mask = mask_from_str(WALLED);
    let plan = GridPathfinder::new()
        .find_route(&mask, &request(Point::new(5, 5), Point::new(95, 5)))
        .expect("route in the open");
    assert_eq!(plan.waypoints(), &[Point::new(5, 5), Point::new(95, 5)]);
    assert!(!plan.is_direct());
}

#[test]
fn test_route_detours_around_wall() {
    let mask = mask_from_str(WALLED);
    let start = Point::new(25, 45);
    let end = Point::new(85, 45);
    let plan = GridPathfinder::new()
        .find_route(&mask, &request(start, end))
        .expect("wall can be walked around");
    let waypoints = plan.waypoints();
    println!("{}", visualize(&mask, waypoints));

    assert_eq!(waypoints.first(), Some(&start));
    assert_eq!(waypoints.last(), Some(&end));
    assert!(waypoints.len() > 2, "expected a detour: {}", format_path(waypoints));
    for pair in waypoints.windows(2) {
        assert!(
            mask.line_of_sight(pair[0], pair[1]),
            "leg {:?} -> {:?} crosses a wall",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn test_no_route_to_wall() {
    let mask = mask_from_str(WALLED);
    let plan = GridPathfinder::new().find_route(&mask, &request(Point::new(25, 45), Point::new(55, 45)));
    assert!(plan.is_none());
}

#[test]
fn test_no_route_into_closed_area() {
    let mask = mask_from_str(
        r#"
        ..........
        ..........
        ......###.
        ......#.#.
        ......###.
        ..........
        "#,
    );
    let plan = GridPathfinder::new().find_route(&mask, &request(Point::new(5, 5), Point::new(75, 35)));
    assert!(plan.is_none());
}

#[test]
fn test_ignoring_walls_goes_straight_through() {
    let mask = mask_from_str(WALLED);
    let mut req = request(Point::new(25, 45), Point::new(85, 45));
    req.ignore_walls = true;
    let plan = GridPathfinder::new().find_route(&mask, &req).expect("direct route");
    assert_eq!(plan.waypoints().len(), 2);
    assert!(plan.is_direct());
}
