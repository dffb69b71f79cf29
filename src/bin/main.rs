use avl_set::AvlSet;

fn main() {
    let mut set: AvlSet<u32> = AvlSet::new();

    for value in [2, 0, 3, 4, 5, 1, 6] {
        set.insert(value);
        set.assert_invariants();
        println!("{:?}", set.iter().collect::<Vec<_>>());
    }

    let mut graph = String::new();
    set.dotgraph("demo", &mut graph).expect("writing to a String cannot fail");
    println!("{graph}");

    let four = set.find(&4);
    println!("rank of 4: {:?}", set.rank(four));
    println!("upper bound of 4: {:?}", set.get(set.upper_bound(&4)));

    let zero = set.pop_first().unwrap();
    assert_eq!(zero, 0);
    set.assert_invariants();

    // Positions are not disturbed by removing other values.
    assert_eq!(set.get(four), Some(&4));

    drop(set);
}
