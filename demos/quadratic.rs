use console::style;
use lazydag::Scheduler;

/// Solves `a*x^2 + b*x + c = 0` as a graph of small tasks.
///
/// Topology:
///        [-4ac]
///          |
///     [discriminant]
///       /        \
/// [-b + sqrt]  [-b - sqrt]
///      |            |
///   [x1]          [x2]
///                   |
///                 [x2 + 3]

#[derive(Clone, Copy)]
struct AddNumber {
    number: f32,
}

impl AddNumber {
    fn add(&self, a: f32) -> f32 {
        a + self.number
    }
}

fn main() -> anyhow::Result<()> {
    #[cfg(feature = "logging")]
    lazydag::init_logging()?;

    let a = 1.0f32;
    let b = -2.0f32;
    let c = 0.0f32;

    let add = AddNumber { number: 3.0 };

    let mut scheduler = Scheduler::new();

    let id1 = scheduler
        .task()
        .name("-4ac")
        .run(|aa: f32, cc: f32| -4.0 * aa * cc, (a, c));

    let h1 = scheduler.future_result::<f32>(id1);
    let id2 = scheduler
        .task()
        .name("discriminant")
        .run(|bb: f32, v: f32| bb * bb + v, (b, h1));

    let h2 = scheduler.future_result::<f32>(id2);
    let id3 = scheduler
        .task()
        .name("-b + sqrt(d)")
        .run(|bb: f32, d: f32| -bb + d.sqrt(), (b, h2));
    let id4 = scheduler
        .task()
        .name("-b - sqrt(d)")
        .run(|bb: f32, d: f32| -bb - d.sqrt(), (b, h2));

    let h3 = scheduler.future_result::<f32>(id3);
    let id5 = scheduler
        .task()
        .name("x1")
        .run(|aa: f32, v: f32| v / (2.0 * aa), (a, h3));

    let h4 = scheduler.future_result::<f32>(id4);
    let id6 = scheduler
        .task()
        .name("x2")
        .run(|aa: f32, v: f32| v / (2.0 * aa), (a, h4));

    let h6 = scheduler.future_result::<f32>(id6);
    let id7 = scheduler
        .task()
        .name("x2 + 3")
        .run(move |x: f32| add.add(x), h6);

    scheduler.validate()?;
    scheduler.execute_all()?;

    println!("x1 = {}", style(scheduler.get_result::<f32>(id5)?).green());
    println!("x2 = {}", style(scheduler.get_result::<f32>(id6)?).green());
    println!("x3 = {}", style(scheduler.get_result::<f32>(id7)?).green());

    println!();
    println!("{}", style("Task graph:").bold());
    print!("{scheduler}");

    Ok(())
}
