/// Labels every node of the directed graph (given as adjacency lists) with the index of its
/// strongly connected component, using an iterative version of Tarjan's algorithm.
///
/// Components are numbered in the order in which they are completed, which is a reverse
/// topological order of the condensation.
pub(super) fn strongly_connected_components(graph: &[Vec<usize>]) -> Vec<usize> {
    const UNVISITED: usize = usize::MAX;

    let num_nodes = graph.len();
    let mut index = vec![UNVISITED; num_nodes];
    let mut low_link = vec![0; num_nodes];
    let mut on_stack = vec![false; num_nodes];
    let mut component = vec![UNVISITED; num_nodes];

    let mut stack = Vec::new();
    // The nodes whose edges are being explored, with the position of the next edge.
    let mut call_stack: Vec<(usize, usize)> = Vec::new();
    let mut next_index = 0;
    let mut num_components = 0;

    for root in 0..num_nodes {
        if index[root] != UNVISITED {
            continue;
        }

        index[root] = next_index;
        low_link[root] = next_index;
        next_index += 1;
        stack.push(root);
        on_stack[root] = true;
        call_stack.push((root, 0));

        while let Some(&(node, edge)) = call_stack.last() {
            if edge < graph[node].len() {
                if let Some(frame) = call_stack.last_mut() {
                    frame.1 += 1;
                }

                let successor = graph[node][edge];
                if index[successor] == UNVISITED {
                    index[successor] = next_index;
                    low_link[successor] = next_index;
                    next_index += 1;
                    stack.push(successor);
                    on_stack[successor] = true;
                    call_stack.push((successor, 0));
                } else if on_stack[successor] {
                    low_link[node] = low_link[node].min(index[successor]);
                }
                continue;
            }

            let _ = call_stack.pop();
            if let Some(&(parent, _)) = call_stack.last() {
                low_link[parent] = low_link[parent].min(low_link[node]);
            }

            if low_link[node] == index[node] {
                while let Some(member) = stack.pop() {
                    on_stack[member] = false;
                    component[member] = num_components;
                    if member == node {
                        break;
                    }
                }
                num_components += 1;
            }
        }
    }

    component
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycles_form_components() {
        // 0 -> 1 -> 2 -> 0, 2 -> 3, 3 -> 4 -> 3
        let graph = vec![vec![1], vec![2], vec![0, 3], vec![4], vec![3]];

        let components = strongly_connected_components(&graph);

        assert_eq!(components[0], components[1]);
        assert_eq!(components[1], components[2]);
        assert_eq!(components[3], components[4]);
        assert_ne!(components[0], components[3]);
    }

    #[test]
    fn acyclic_nodes_are_singletons() {
        let graph = vec![vec![1, 2], vec![2], vec![]];

        let components = strongly_connected_components(&graph);

        assert_ne!(components[0], components[1]);
        assert_ne!(components[1], components[2]);
        assert_ne!(components[0], components[2]);
    }
}
