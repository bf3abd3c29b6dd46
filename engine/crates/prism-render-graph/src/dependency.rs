//! 依赖图构建和拓扑排序
//!
//! 只建模写后读：资源 X 的写入者 → 读取 X 的 pass。
//! 写后写、读后写不产生边，只体现在 barrier 中。

use std::collections::{HashMap, VecDeque};

use crate::handle::RgResourceHandle;
use crate::pass::RgPassNode;

/// 依赖图
///
/// 节点是 pass 的声明下标，边从 producer 指向 consumer。
pub struct RgDependencyGraph {
    /// Pass 数量
    pass_count: usize,
    /// 邻接表（出边）
    adjacency: Vec<Vec<usize>>,
    /// 入度表
    in_degrees: Vec<usize>,
}

impl RgDependencyGraph {
    pub fn new(pass_count: usize) -> Self {
        Self {
            pass_count,
            adjacency: vec![Vec::new(); pass_count],
            in_degrees: vec![0; pass_count],
        }
    }

    /// 从 pass 的读写声明构建依赖图
    ///
    /// 按声明顺序遍历：读取者依赖于在它之前声明的最后一个写入者。
    /// 之前没有写入者时不产生边，读到的是资源进入 graph 时的内容。
    pub fn build(passes: &[RgPassNode]) -> Self {
        let mut graph = Self::new(passes.len());

        // 目前为止每个资源的最后一个写入者
        let mut last_writers: HashMap<RgResourceHandle, usize> = HashMap::new();
        for (pass_idx, pass) in passes.iter().enumerate() {
            for handle in &pass.reads {
                if let Some(&producer) = last_writers.get(handle) {
                    graph.add_edge(producer, pass_idx);
                }
            }
            for write in &pass.writes {
                last_writers.insert(write.handle, pass_idx);
            }
        }

        graph
    }

    /// 添加依赖边，重复的边会被忽略
    pub fn add_edge(&mut self, producer: usize, consumer: usize) {
        if !self.adjacency[producer].contains(&consumer) {
            self.adjacency[producer].push(consumer);
            self.in_degrees[consumer] += 1;
        }
    }

    /// Kahn 拓扑排序
    ///
    /// 入度为 0 的 pass 按声明顺序入队，因此没有依赖关系的 pass 保持声明顺序。
    ///
    /// # 返回
    /// - `Ok(order)`: 拓扑排序后的 Pass 下标
    /// - `Err(cycle)`: 检测到循环依赖，返回排序结束后入度仍大于 0 的 Pass 下标
    pub fn topological_sort(&self) -> Result<Vec<usize>, Vec<usize>> {
        let mut in_degrees = self.in_degrees.clone();
        let mut queue: VecDeque<usize> = (0..self.pass_count).filter(|&i| in_degrees[i] == 0).collect();
        let mut result = Vec::with_capacity(self.pass_count);

        while let Some(node) = queue.pop_front() {
            result.push(node);

            for &neighbor in &self.adjacency[node] {
                in_degrees[neighbor] -= 1;
                if in_degrees[neighbor] == 0 {
                    queue.push_back(neighbor);
                }
            }
        }

        if result.len() != self.pass_count {
            let remaining: Vec<usize> = (0..self.pass_count).filter(|&i| in_degrees[i] > 0).collect();
            Err(remaining)
        } else {
            Ok(result)
        }
    }

    /// 获取 Pass 的直接后继
    pub fn successors(&self, pass_index: usize) -> &[usize] {
        &self.adjacency[pass_index]
    }

    /// 获取 Pass 的直接前驱
    pub fn predecessors(&self, pass_index: usize) -> Vec<usize> {
        (0..self.pass_count).filter(|&i| self.adjacency[i].contains(&pass_index)).collect()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_dependency() {
        let mut graph = RgDependencyGraph::new(2);
        graph.add_edge(0, 1);
        assert_eq!(graph.topological_sort().unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_reverse_declaration() {
        // Pass 1 -> Pass 0
        let mut graph = RgDependencyGraph::new(2);
        graph.add_edge(1, 0);
        assert_eq!(graph.topological_sort().unwrap(), vec![1, 0]);
        assert_eq!(graph.predecessors(0), vec![1]);
    }

    #[test]
    fn test_duplicate_edges() {
        let mut graph = RgDependencyGraph::new(3);
        graph.add_edge(0, 2);
        graph.add_edge(0, 2);
        graph.add_edge(1, 2);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.successors(0), &[2]);
        assert_eq!(graph.topological_sort().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_cycle() {
        // 0 -> 1 -> 2 -> 1
        let mut graph = RgDependencyGraph::new(3);
        graph.add_edge(0, 1);
        graph.add_edge(1, 2);
        graph.add_edge(2, 1);
        assert_eq!(graph.topological_sort().unwrap_err(), vec![1, 2]);
    }
}
